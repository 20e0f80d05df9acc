use crate::notify::error::NotifyError;

/// # Summary
/// 用户可见消息的级别。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageLevel {
    Info,
    Warning,
    Error,
}

/// # Summary
/// 向用户展示提示消息 (toast) 的接口定义。
///
/// # Invariants
/// - 实现必须是 `Send` 和 `Sync` 以支持在后台任务中调用。
/// - 消息展示失败不影响调度，调用方只记录日志。
pub trait Notifier: Send + Sync {
    /// # Summary
    /// 展示一条消息。
    ///
    /// # Arguments
    /// * `level` - 消息级别。
    /// * `message` - 消息正文。
    ///
    /// # Returns
    /// * 成功返回 `Ok(())`。
    /// * 失败返回 `Err(NotifyError)`。
    fn notify(&self, level: MessageLevel, message: &str) -> Result<(), NotifyError>;
}
