use crate::common::Direction;
use crate::market::entity::{AdviceBundle, SeriesPoint};
use crate::view::entity::{AxisRange, ChartLabel, IncrementalView, StatusSummary, ViewModel};
use crate::view::error::RenderError;

/// # Summary
/// 图表的样式提示，由适配层翻译为具体绘图库的配置。
#[derive(Debug, Clone, PartialEq)]
pub struct StyleHint {
    // 折线颜色
    pub line_color: &'static str,
    // 面积填充颜色
    pub area_color: &'static str,
    // 纵轴范围，None 表示交给后端自适应
    pub y_axis: Option<AxisRange>,
}

impl StyleHint {
    /// # Summary
    /// 按涨跌方向选择配色 (红涨绿跌)。
    ///
    /// # Arguments
    /// * `direction`: 最新涨跌方向。
    /// * `y_axis`: 纵轴范围。
    ///
    /// # Returns
    /// 样式提示。
    pub fn for_direction(direction: Direction, y_axis: Option<AxisRange>) -> Self {
        let (line_color, area_color) = match direction {
            Direction::Rising => ("#F53F3F", "rgba(245, 63, 63, 0.1)"),
            Direction::Falling => ("#00B42A", "rgba(0, 180, 42, 0.1)"),
            Direction::Flat => ("#86909C", "rgba(134, 144, 156, 0.1)"),
        };
        Self {
            line_color,
            area_color,
            y_axis,
        }
    }
}

/// # Summary
/// 图表以外的文本面板。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    // 数据概览
    Overview,
    // 状态栏
    Status,
    // 投资建议
    Advice,
    // 图表区域占位提示 (无监控标的时)
    ChartsPlaceholder,
}

/// # Summary
/// 外部绘图后端契约，对应具体的图表库或终端界面。
///
/// # Invariants
/// - 后端不持有任何业务状态，只负责把给定数据画出来。
pub trait ChartBackend: Send {
    /// # Summary
    /// 创建图表，若已存在则原地更新数据与样式。
    ///
    /// # Arguments
    /// * `chart_id`: 图表 id。
    /// * `points`: 完整的数据点序列。
    /// * `style`: 样式提示。
    ///
    /// # Returns
    /// 成功返回 Ok。
    fn create_or_update_chart(
        &mut self,
        chart_id: &str,
        points: &[SeriesPoint],
        style: &StyleHint,
    ) -> Result<(), RenderError>;

    /// # Summary
    /// 销毁图表并释放其资源。
    fn dispose_chart(&mut self, chart_id: &str) -> Result<(), RenderError>;

    /// # Summary
    /// 更新图表卡片的标题、副标题与最新值标签。
    fn set_chart_header(
        &mut self,
        chart_id: &str,
        title: &str,
        subtitle: &str,
        label: &ChartLabel,
    ) -> Result<(), RenderError>;

    /// # Summary
    /// 整体替换某个文本面板的内容。
    fn set_panel(&mut self, panel: Panel, lines: &[String]) -> Result<(), RenderError>;
}

/// # Summary
/// 引擎调用的渲染入口契约。
///
/// # Invariants
/// - 引擎只通过这些入口影响展示状态，从不持有图表句柄。
/// - 实现者内部吞掉渲染错误，调用方无需处理。
pub trait RenderBridge: Send {
    /// # Summary
    /// 全量渲染：销毁已有图表后按视图模型重建。
    ///
    /// # Logic
    /// 1. 销毁注册表中的全部图表。
    /// 2. 为每个有窗口的标的创建图表与标题。
    /// 3. 刷新概览面板。
    fn render_full(&mut self, view: &ViewModel);

    /// # Summary
    /// 增量渲染：在已有图表上追加新点。
    ///
    /// # Logic
    /// 1. 对每个更新项原地替换数据并按窗口重算纵轴。
    /// 2. 刷新最新值标签，不重建图表对象。
    /// 3. 没有对应图表的更新项直接跳过。
    /// 4. 刷新概览面板。
    fn render_incremental(&mut self, view: &IncrementalView);

    /// # Summary
    /// 刷新状态栏。
    fn render_status(&mut self, status: &StatusSummary);

    /// # Summary
    /// 刷新投资建议面板，None 时展示固定占位文案。
    fn render_advice(&mut self, advice: Option<&AdviceBundle>);
}
