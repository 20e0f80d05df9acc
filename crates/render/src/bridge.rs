use crate::registry::{ChartEntry, ChartRegistry};
use fundwatch_core::market::entity::AdviceBundle;
use fundwatch_core::view::entity::{
    AxisRange, IncrementalView, OverviewItem, StatusSummary, ViewModel,
};
use fundwatch_core::view::error::RenderError;
use fundwatch_core::view::port::{ChartBackend, Panel, RenderBridge, StyleHint};
use tracing::{debug, warn};

pub const EMPTY_CHARTS_TEXT: &str = "暂无监控数据，请先前往配置中心设置指数/基金代码";
pub const ADVICE_PLACEHOLDER: &str = "暂无足够数据生成投资建议，请等待数据加载完成。";
pub const DEFAULT_RISK_WARNING: &str = "投资有风险，决策需谨慎。以上建议仅供参考，不构成投资指导。";

/// # Summary
/// `RenderBridge` 的适配实现：把视图模型翻译为对 `ChartBackend` 的调用。
///
/// # Invariants
/// - 注册表由本实例独占，记录后端当前存活的全部图表。
/// - 后端错误只记录 warn 日志，不会向调用方传播。
pub struct ChartRenderer<B: ChartBackend> {
    backend: B,
    registry: ChartRegistry,
    // 增量渲染时纵轴的上下边距
    axis_margin: f64,
}

impl<B: ChartBackend> ChartRenderer<B> {
    pub fn new(backend: B, axis_margin: f64) -> Self {
        Self {
            backend,
            registry: ChartRegistry::new(),
            axis_margin,
        }
    }

    pub fn registry(&self) -> &ChartRegistry {
        &self.registry
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn dispose_all(&mut self) {
        for chart_id in self.registry.drain() {
            report(self.backend.dispose_chart(&chart_id), "dispose chart", &chart_id);
        }
    }

    fn render_overview(&mut self, items: &[OverviewItem]) {
        let lines: Vec<String> = items.iter().map(overview_line).collect();
        report(
            self.backend.set_panel(Panel::Overview, &lines),
            "update panel",
            "overview",
        );
    }
}

impl<B: ChartBackend> RenderBridge for ChartRenderer<B> {
    fn render_full(&mut self, view: &ViewModel) {
        self.dispose_all();

        let placeholder = if view.charts.is_empty() {
            vec![EMPTY_CHARTS_TEXT.to_string()]
        } else {
            Vec::new()
        };
        report(
            self.backend.set_panel(Panel::ChartsPlaceholder, &placeholder),
            "update panel",
            "charts placeholder",
        );

        for chart in &view.charts {
            let style = StyleHint::for_direction(chart.label.direction, None);
            report(
                self.backend
                    .create_or_update_chart(&chart.chart_id, &chart.points, &style),
                "create chart",
                &chart.chart_id,
            );
            report(
                self.backend.set_chart_header(
                    &chart.chart_id,
                    &chart.title,
                    &chart.subtitle,
                    &chart.label,
                ),
                "update header",
                &chart.chart_id,
            );
            self.registry.register(
                chart.chart_id.clone(),
                ChartEntry {
                    title: chart.title.clone(),
                    subtitle: chart.subtitle.clone(),
                    points: chart.points.clone(),
                    style,
                },
            );
        }
        debug!("Full render: {} charts", self.registry.len());

        self.render_overview(&view.overview_items);
    }

    /// # Summary
    /// 在已有图表上原地刷新数据。
    ///
    /// # Logic
    /// 1. 没有登记的图表 id 直接跳过。
    /// 2. 按新窗口重算纵轴范围，折线配色沿用创建时的设置。
    /// 3. 替换数据点并刷新带符号的最新值标签。
    /// 4. 刷新概览面板。
    fn render_incremental(&mut self, view: &IncrementalView) {
        for update in &view.updates {
            let Some(entry) = self.registry.get_mut(&update.chart_id) else {
                debug!("Skipping update for unregistered chart {}", update.chart_id);
                continue;
            };

            let y_axis = AxisRange::around(update.window.iter().map(|p| p.value), self.axis_margin);
            entry.style = StyleHint {
                y_axis,
                ..entry.style.clone()
            };
            entry.points = update.window.clone();
            if let Some(subtitle) = &update.subtitle {
                entry.subtitle = subtitle.clone();
            }

            report(
                self.backend
                    .create_or_update_chart(&update.chart_id, &entry.points, &entry.style),
                "update chart",
                &update.chart_id,
            );
            report(
                self.backend.set_chart_header(
                    &update.chart_id,
                    &entry.title,
                    &entry.subtitle,
                    &update.label,
                ),
                "update header",
                &update.chart_id,
            );
        }

        self.render_overview(&view.overview_items);
    }

    fn render_status(&mut self, status: &StatusSummary) {
        let lines = vec![
            format!(
                "最后更新时间：{}",
                status.last_updated.format("%Y-%m-%d %H:%M:%S")
            ),
            "监控状态：🟢 正常运行".to_string(),
            format!("自动刷新间隔：{} 秒", status.refresh_interval_secs),
            format!("累计数据点：{} 个", status.point_count),
            format!(
                "监控标的：指数 {} 个 | 基金 {} 个",
                status.instrument_counts.indices, status.instrument_counts.funds
            ),
        ];
        report(
            self.backend.set_panel(Panel::Status, &lines),
            "update panel",
            "status",
        );
    }

    fn render_advice(&mut self, advice: Option<&AdviceBundle>) {
        let lines = advice_lines(advice);
        report(
            self.backend.set_panel(Panel::Advice, &lines),
            "update panel",
            "advice",
        );
    }
}

fn report(result: Result<(), RenderError>, action: &str, target: &str) {
    if let Err(e) = result {
        warn!("Failed to {} {}: {}", action, target, e);
    }
}

fn overview_line(item: &OverviewItem) -> String {
    match &item.desc {
        Some(desc) => format!("{}：{} ({})", item.label, item.value, desc),
        None => format!("{}：{}", item.label, item.value),
    }
}

/// # Summary
/// 生成投资建议面板的文本行。
///
/// # Logic
/// 1. 没有建议时输出固定占位文案。
/// 2. 依次输出摘要、各条策略，最后是风险提示 (为空时使用默认文案)。
pub fn advice_lines(advice: Option<&AdviceBundle>) -> Vec<String> {
    let Some(advice) = advice else {
        return vec![
            ADVICE_PLACEHOLDER.to_string(),
            format!("⚠️ 风险提示：{}", DEFAULT_RISK_WARNING),
        ];
    };

    let mut lines = Vec::with_capacity(advice.strategies.len() + 2);
    if let Some(summary) = &advice.summary {
        lines.push(summary.clone());
    }
    lines.extend(advice.strategies.iter().cloned());

    let warning = if advice.risk_warning.trim().is_empty() {
        DEFAULT_RISK_WARNING
    } else {
        advice.risk_warning.as_str()
    };
    lines.push(format!("⚠️ 风险提示：{}", warning));
    lines
}
