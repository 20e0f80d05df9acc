use thiserror::Error;

/// # Summary
/// 消息提示错误枚举。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
#[derive(Error, Debug)]
pub enum NotifyError {
    /// 展示通道不可用
    #[error("Channel error: {0}")]
    Channel(String),
}
