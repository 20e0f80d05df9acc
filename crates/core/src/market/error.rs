use thiserror::Error;

/// # Summary
/// 行情接口调用错误枚举，区分传输层故障与服务端业务失败。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
/// - 两类错误都不是致命错误：传输错误按固定延迟重试，业务错误只提示用户。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    // 网络失败、非 2xx 状态码或响应体无法解码
    #[error("Transport error: {0}")]
    Transport(String),
    // 服务端返回 success: false，携带服务端给出的提示信息
    #[error("Payload error: {0}")]
    Payload(String),
}

impl FeedError {
    /// 是否应当按固定延迟重试。
    pub fn is_retryable(&self) -> bool {
        matches!(self, FeedError::Transport(_))
    }
}
