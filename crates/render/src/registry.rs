use fundwatch_core::market::entity::SeriesPoint;
use fundwatch_core::view::port::StyleHint;
use std::collections::BTreeMap;

/// # Summary
/// 已创建图表的登记信息。
#[derive(Debug, Clone, PartialEq)]
pub struct ChartEntry {
    pub title: String,
    pub subtitle: String,
    // 最近一次交给后端的数据点
    pub points: Vec<SeriesPoint>,
    pub style: StyleHint,
}

/// # Summary
/// 图表 id 到图表状态的注册表，每个渲染器实例独占一份。
///
/// # Invariants
/// - 注册表中的 id 与后端当前存活的图表一一对应。
#[derive(Debug, Default)]
pub struct ChartRegistry {
    charts: BTreeMap<String, ChartEntry>,
}

impl ChartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, chart_id: impl Into<String>, entry: ChartEntry) {
        self.charts.insert(chart_id.into(), entry);
    }

    pub fn get(&self, chart_id: &str) -> Option<&ChartEntry> {
        self.charts.get(chart_id)
    }

    pub fn get_mut(&mut self, chart_id: &str) -> Option<&mut ChartEntry> {
        self.charts.get_mut(chart_id)
    }

    pub fn contains(&self, chart_id: &str) -> bool {
        self.charts.contains_key(chart_id)
    }

    /// 移除全部登记并返回被移除的 id。
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.charts).into_keys().collect()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.charts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }
}
