use crate::common::{Direction, InstrumentId};
use crate::market::entity::SeriesPoint;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// # Summary
/// 某一涨跌方向的标的数量，按类别拆分。
///
/// # Invariants
/// - `total == indices + funds`，由构造函数保证。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionCount {
    pub indices: u32,
    pub funds: u32,
    pub total: u32,
}

impl DirectionCount {
    pub fn new(indices: u32, funds: u32) -> Self {
        Self {
            indices,
            funds,
            total: indices.saturating_add(funds),
        }
    }
}

/// # Summary
/// 极值项 (最大涨幅或最大跌幅)。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extreme {
    pub name: String,
    pub value: f64,
}

/// # Summary
/// 市场风险等级标签。
///
/// # Invariants
/// - 上游未提供或提供空白标签时一律为 `Undetermined`。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    #[default]
    Undetermined,
    Reported(String),
}

impl RiskLevel {
    pub fn is_undetermined(&self) -> bool {
        matches!(self, RiskLevel::Undetermined)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Undetermined => write!(f, "未检测"),
            RiskLevel::Reported(label) => write!(f, "{}", label),
        }
    }
}

/// # Summary
/// 归一化后的概览指标，永远完整可渲染。
///
/// # Invariants
/// - `rising.total + falling.total + flat.total == classified()`。
/// - 极值缺失时为 None，渲染层不会把它画成 0。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverviewMetrics {
    pub rising: DirectionCount,
    pub falling: DirectionCount,
    pub flat: DirectionCount,
    pub max_rise: Option<Extreme>,
    pub max_fall: Option<Extreme>,
    pub risk_level: RiskLevel,
}

impl OverviewMetrics {
    /// 本周期参与分类的标的总数。
    pub fn classified(&self) -> u32 {
        self.rising
            .total
            .saturating_add(self.falling.total)
            .saturating_add(self.flat.total)
    }
}

/// # Summary
/// 概览项的配色语义。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverviewTone {
    Rising,
    Falling,
    Neutral,
    Warning,
}

/// # Summary
/// 概览面板中的一项。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewItem {
    pub label: String,
    pub value: String,
    pub desc: Option<String>,
    pub tone: OverviewTone,
}

/// # Summary
/// 图表标题旁的最新涨跌幅标签。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartLabel {
    pub text: String,
    pub direction: Direction,
}

impl ChartLabel {
    /// # Summary
    /// 根据最新涨跌幅生成带符号的标签。
    ///
    /// # Logic
    /// 正数加 `+` 前缀，统一追加 `%`，方向用于红涨绿跌配色。
    pub fn of(value: f64) -> Self {
        let text = if value > 0.0 {
            format!("+{}%", value)
        } else {
            format!("{}%", value)
        };
        Self {
            text,
            direction: Direction::of(value),
        }
    }
}

/// # Summary
/// 单个标的的完整图表视图，用于全量渲染。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartView {
    pub id: InstrumentId,
    pub chart_id: String,
    pub title: String,
    pub subtitle: String,
    pub label: ChartLabel,
    pub points: Vec<SeriesPoint>,
}

/// # Summary
/// 单个标的的增量更新视图。
///
/// # Invariants
/// - `window` 为追加新点之后的完整窗口 (已按容量淘汰)，`point` 是其最后一个元素。
/// - `subtitle` 为 None 时沿用图表已有的副标题。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartUpdate {
    pub id: InstrumentId,
    pub chart_id: String,
    pub subtitle: Option<String>,
    pub point: SeriesPoint,
    pub label: ChartLabel,
    pub window: Vec<SeriesPoint>,
}

/// # Summary
/// 全量渲染的视图模型。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub charts: Vec<ChartView>,
    pub overview: OverviewMetrics,
    pub overview_items: Vec<OverviewItem>,
}

/// # Summary
/// 增量渲染的视图模型。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncrementalView {
    pub timestamp: String,
    pub updates: Vec<ChartUpdate>,
    pub overview: OverviewMetrics,
    pub overview_items: Vec<OverviewItem>,
}

/// # Summary
/// 按类别统计的监控标的数量。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentCounts {
    pub indices: usize,
    pub funds: usize,
}

/// # Summary
/// 状态栏信息。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub last_updated: DateTime<Local>,
    // 累计保留的数据点 (最长窗口的长度)
    pub point_count: usize,
    pub instrument_counts: InstrumentCounts,
    pub refresh_interval_secs: u64,
}

/// # Summary
/// 图表纵轴的显示范围。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    /// # Summary
    /// 计算包住全部数值的纵轴范围，上下各留出固定边距。
    ///
    /// # Logic
    /// 1. 忽略非有限值。
    /// 2. 取最小值与最大值，分别减去/加上 `margin`。
    ///
    /// # Arguments
    /// * `values`: 窗口中的数值。
    /// * `margin`: 边距 (与数值同单位)。
    ///
    /// # Returns
    /// 没有任何有限值时返回 None。
    pub fn around<I>(values: I, margin: f64) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })?;
        Some(Self {
            min: min - margin,
            max: max + margin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_range_margin() {
        let range = AxisRange::around([1.0, -0.5, f64::NAN, 0.25], 0.05).unwrap();
        assert!((range.min - -0.55).abs() < 1e-9);
        assert!((range.max - 1.05).abs() < 1e-9);
        assert!(AxisRange::around(Vec::<f64>::new(), 0.05).is_none());
    }

    #[test]
    fn test_chart_label_sign() {
        assert_eq!(ChartLabel::of(1.2).text, "+1.2%");
        assert_eq!(ChartLabel::of(-0.3).text, "-0.3%");
        assert_eq!(ChartLabel::of(0.0).direction, Direction::Flat);
    }

    #[test]
    fn test_default_overview_is_empty() {
        let m = OverviewMetrics::default();
        assert_eq!(m.classified(), 0);
        assert_eq!(m.risk_level.to_string(), "未检测");
    }
}
