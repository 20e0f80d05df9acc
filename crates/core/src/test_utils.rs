//! 测试替身：脚本化的后端接口、记录型渲染桥与消息通道。
//!
//! 仅在 `test-utils` feature 下编译，供各 crate 的集成测试复用。

use crate::common::InstrumentId;
use crate::market::entity::{
    AdviceBundle, DataPayload, HistoryMatrix, IncrementalDelta, Instrument, MonitorConfig,
    RawMetrics, Snapshot,
};
use crate::market::error::FeedError;
use crate::market::port::{DashboardApi, FetchKind};
use crate::notify::error::NotifyError;
use crate::notify::port::{MessageLevel, Notifier};
use crate::view::entity::{IncrementalView, StatusSummary, ViewModel};
use crate::view::port::RenderBridge;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type DataScript = VecDeque<Result<DataPayload, FeedError>>;

/// # Summary
/// 按脚本顺序返回响应的后端接口替身。
///
/// # Invariants
/// - 每个队列只剩最后一个响应时，该响应会被重复返回，便于长时间轮询测试。
/// - 队列为空时返回传输错误。
#[derive(Default)]
pub struct ScriptedApi {
    data: DashMap<FetchKind, DataScript>,
    advice: Mutex<VecDeque<Result<AdviceBundle, FeedError>>>,
    config: Mutex<Option<Result<MonitorConfig, FeedError>>>,
    calls: DashMap<FetchKind, usize>,
    advice_calls: AtomicUsize,
    config_calls: AtomicUsize,
}

impl ScriptedApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_data(&self, kind: FetchKind, response: Result<DataPayload, FeedError>) {
        self.data.entry(kind).or_default().push_back(response);
    }

    pub fn push_advice(&self, response: Result<AdviceBundle, FeedError>) {
        self.advice
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(response);
    }

    pub fn set_config(&self, response: Result<MonitorConfig, FeedError>) {
        *self.config.lock().unwrap_or_else(|e| e.into_inner()) = Some(response);
    }

    /// 指定类型的 `fetch_data` 调用次数。
    pub fn data_calls(&self, kind: FetchKind) -> usize {
        self.calls.get(&kind).map(|c| *c).unwrap_or(0)
    }

    pub fn advice_calls(&self) -> usize {
        self.advice_calls.load(Ordering::SeqCst)
    }

    pub fn config_calls(&self) -> usize {
        self.config_calls.load(Ordering::SeqCst)
    }

    fn next_sticky<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl DashboardApi for ScriptedApi {
    async fn fetch_config(&self) -> Result<MonitorConfig, FeedError> {
        self.config_calls.fetch_add(1, Ordering::SeqCst);
        self.config
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .unwrap_or_else(|| Ok(MonitorConfig::parse("A|a", "", 30)))
    }

    async fn fetch_data(&self, kind: FetchKind) -> Result<DataPayload, FeedError> {
        *self.calls.entry(kind).or_insert(0) += 1;
        let next = self
            .data
            .get_mut(&kind)
            .and_then(|mut queue| Self::next_sticky(&mut *queue));
        next.unwrap_or_else(|| Err(FeedError::Transport("no scripted response".into())))
    }

    async fn fetch_advice(&self) -> Result<AdviceBundle, FeedError> {
        self.advice_calls.fetch_add(1, Ordering::SeqCst);
        let mut queue = self.advice.lock().unwrap_or_else(|e| e.into_inner());
        Self::next_sticky(&mut *queue)
            .unwrap_or_else(|| Err(FeedError::Payload("no advice".into())))
    }
}

/// # Summary
/// 渲染桥收到的一次调用。
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    Full(ViewModel),
    Incremental(IncrementalView),
    Status(StatusSummary),
    Advice(Option<AdviceBundle>),
}

/// # Summary
/// 记录所有渲染调用的渲染桥替身，克隆后共享同一份记录。
#[derive(Clone, Default)]
pub struct RecordingBridge {
    calls: Arc<Mutex<Vec<RenderCall>>>,
}

impl RecordingBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn full_renders(&self) -> Vec<ViewModel> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RenderCall::Full(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    pub fn incremental_renders(&self) -> Vec<IncrementalView> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RenderCall::Incremental(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    pub fn status_renders(&self) -> Vec<StatusSummary> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RenderCall::Status(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn advice_renders(&self) -> Vec<Option<AdviceBundle>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RenderCall::Advice(a) => Some(a),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: RenderCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }
}

impl RenderBridge for RecordingBridge {
    fn render_full(&mut self, view: &ViewModel) {
        self.record(RenderCall::Full(view.clone()));
    }

    fn render_incremental(&mut self, view: &IncrementalView) {
        self.record(RenderCall::Incremental(view.clone()));
    }

    fn render_status(&mut self, status: &StatusSummary) {
        self.record(RenderCall::Status(status.clone()));
    }

    fn render_advice(&mut self, advice: Option<&AdviceBundle>) {
        self.record(RenderCall::Advice(advice.cloned()));
    }
}

/// # Summary
/// 记录所有提示消息的消息通道替身。
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(MessageLevel, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<(MessageLevel, String)> {
        self.messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn count(&self, level: MessageLevel) -> usize {
        self.messages().iter().filter(|(l, _)| *l == level).count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: MessageLevel, message: &str) -> Result<(), NotifyError> {
        self.messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((level, message.to_string()));
        Ok(())
    }
}

/// # Summary
/// 构造一个只含指数的快照。
///
/// # Arguments
/// * `time`: 共享时间轴。
/// * `series`: (指数名称, 历史涨跌幅) 列表，最新涨跌幅取历史最后一个值。
/// * `refresh_interval_secs`: 刷新间隔。
pub fn index_snapshot(
    time: &[&str],
    series: &[(&str, &[f64])],
    refresh_interval_secs: u64,
) -> Snapshot {
    let mut values = BTreeMap::new();
    let mut instruments = Vec::new();
    for (name, history) in series {
        let latest = history.last().copied().unwrap_or(0.0);
        instruments.push(Instrument::index(*name, 3000.0, 3000.0, latest));
        values.insert(InstrumentId::index(*name), history.to_vec());
    }
    Snapshot {
        time: time.last().map(|t| t.to_string()).unwrap_or_default(),
        instruments,
        history: HistoryMatrix {
            time: time.iter().map(|t| t.to_string()).collect(),
            values,
        },
        metrics: RawMetrics::default(),
        refresh_interval_secs,
        errors: Vec::new(),
        last_update_time: None,
    }
}

/// # Summary
/// 构造一个只含指数取值的增量。
pub fn index_delta(
    timestamp: &str,
    values: &[(&str, f64)],
    refresh_interval_secs: u64,
) -> IncrementalDelta {
    IncrementalDelta {
        timestamp: timestamp.to_string(),
        per_key_value: values
            .iter()
            .map(|(name, v)| (InstrumentId::index(*name), *v))
            .collect(),
        instruments: values
            .iter()
            .map(|(name, v)| Instrument::index(*name, 3000.0, 3000.0, *v))
            .collect(),
        metrics: RawMetrics::default(),
        refresh_interval_secs,
        errors: Vec::new(),
    }
}
