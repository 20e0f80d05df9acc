use chrono::{DateTime, Local};

/// 状态栏 "最后更新时间" 的时间来源。
pub trait TimeProvider: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// 系统本地时钟
pub struct RealTimeProvider;

impl TimeProvider for RealTimeProvider {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// # Summary
/// 永远返回同一时刻的时钟，用于断言状态栏时间。
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl TimeProvider for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}
