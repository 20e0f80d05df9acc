use crate::window::SeriesWindow;
use fundwatch_core::common::InstrumentId;
use fundwatch_core::config::MonitorSettings;
use fundwatch_core::market::entity::{IncrementalDelta, SeriesPoint, Snapshot};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

/// # Summary
/// 增量数值被拒绝的原因 (数据异常)。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    // NaN 或无穷大
    NonFinite,
    // 绝对值超过合理性上限
    OutOfBounds,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NonFinite => write!(f, "non-finite value"),
            Rejection::OutOfBounds => write!(f, "value exceeds sanity bound"),
        }
    }
}

/// # Summary
/// 一次增量合并的结果明细。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeltaOutcome {
    // 成功追加新点的标的
    pub appended: Vec<InstrumentId>,
    // 因数据异常被跳过的标的
    pub rejected: Vec<(InstrumentId, Rejection)>,
    // 尚无窗口、被忽略的标的
    pub ignored: Vec<InstrumentId>,
}

/// # Summary
/// 所有标的滚动窗口的唯一属主。
///
/// # Invariants
/// - 窗口只由快照创建，增量永远不会新建窗口。
/// - 每个窗口长度不超过 `capacity`。
/// - 窗口中的每个值都是有限数且绝对值不超过 `max_abs_change`。
#[derive(Debug, Clone)]
pub struct SeriesStore {
    windows: BTreeMap<InstrumentId, SeriesWindow>,
    capacity: usize,
    max_abs_change: f64,
}

impl SeriesStore {
    /// # Summary
    /// 创建空的存储。
    ///
    /// # Arguments
    /// * `capacity`: 每个窗口的容量。
    /// * `max_abs_change`: 涨跌幅合理性上限 (百分比绝对值)。
    pub fn new(capacity: usize, max_abs_change: f64) -> Self {
        Self {
            windows: BTreeMap::new(),
            capacity,
            max_abs_change,
        }
    }

    pub fn from_settings(settings: &MonitorSettings) -> Self {
        Self::new(settings.window_capacity, settings.max_abs_change)
    }

    /// # Summary
    /// 校验单个涨跌幅数值。
    pub fn validate(&self, value: f64) -> Result<f64, Rejection> {
        if !value.is_finite() {
            Err(Rejection::NonFinite)
        } else if value.abs() > self.max_abs_change {
            Err(Rejection::OutOfBounds)
        } else {
            Ok(value)
        }
    }

    /// # Summary
    /// 用全量快照重建窗口。
    ///
    /// # Logic
    /// 1. 丢弃所有旧窗口，快照即硬重置。
    /// 2. 对快照中的每个标的，把 `history[id]` 与共享时间轴按位配对，
    ///    多出的一侧被截掉。
    /// 3. 剔除异常值后只保留最后 `capacity` 个点。
    /// 4. 没有历史的标的得到一个空窗口，以便后续增量能够追加。
    ///
    /// # Arguments
    /// * `snapshot`: 全量快照。
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot) {
        self.windows.clear();
        let time = &snapshot.history.time;

        for instrument in &snapshot.instruments {
            let values = snapshot
                .history
                .values
                .get(&instrument.id)
                .map(Vec::as_slice)
                .unwrap_or_default();

            let points: Vec<SeriesPoint> = time
                .iter()
                .zip(values)
                .filter_map(|(t, v)| match self.validate(*v) {
                    Ok(value) => Some(SeriesPoint::new(t.clone(), value)),
                    Err(reason) => {
                        warn!(
                            "Dropping snapshot point {} for {}: {} ({})",
                            t, instrument.id, v, reason
                        );
                        None
                    }
                })
                .collect();

            self.windows.insert(
                instrument.id.clone(),
                SeriesWindow::from_points(points, self.capacity),
            );
        }

        info!(
            "Snapshot applied: {} windows, {} time points",
            self.windows.len(),
            time.len()
        );
    }

    /// # Summary
    /// 把增量数值合并进已有窗口。
    ///
    /// # Logic
    /// 1. 非有限值或超出合理性上限的值被拒绝，只跳过该标的，窗口保持不变。
    /// 2. 未被跟踪的标的直接忽略。
    /// 3. 其余值以 `(delta.timestamp, value)` 追加，超出容量时淘汰最旧的点。
    ///
    /// # Arguments
    /// * `delta`: 增量数据。
    ///
    /// # Returns
    /// 本次合并的结果明细。
    pub fn apply_delta(&mut self, delta: &IncrementalDelta) -> DeltaOutcome {
        let mut outcome = DeltaOutcome::default();

        for (id, value) in &delta.per_key_value {
            if let Err(reason) = self.validate(*value) {
                warn!("Rejecting delta value {} for {}: {}", value, id, reason);
                outcome.rejected.push((id.clone(), reason));
                continue;
            }

            match self.windows.get_mut(id) {
                Some(window) => {
                    if let Some(evicted) =
                        window.push(SeriesPoint::new(delta.timestamp.clone(), *value))
                    {
                        debug!("Evicted point {} from {}", evicted.time, id);
                    }
                    outcome.appended.push(id.clone());
                }
                None => {
                    debug!("Ignoring delta for untracked instrument {}", id);
                    outcome.ignored.push(id.clone());
                }
            }
        }

        outcome
    }

    pub fn window_of(&self, id: &InstrumentId) -> Option<&SeriesWindow> {
        self.windows.get(id)
    }

    /// 累计保留的数据点，即最长窗口的长度。
    pub fn point_count(&self) -> usize {
        self.windows.values().map(SeriesWindow::len).max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for SeriesStore {
    fn default() -> Self {
        Self::from_settings(&MonitorSettings::default())
    }
}
