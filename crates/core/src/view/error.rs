use thiserror::Error;

/// # Summary
/// 渲染后端错误枚举。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
/// - 渲染错误只记录日志，不会回传给调度器。
#[derive(Error, Debug)]
pub enum RenderError {
    // 目标图表不存在
    #[error("Chart not found: {0}")]
    ChartNotFound(String),
    // 后端 (绘图库、终端等) 故障
    #[error("Backend error: {0}")]
    Backend(String),
}
