use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 全局应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub monitor: MonitorSettings,
    pub log: LogConfig,
}

/// 看板后端连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    // 后端地址，如 http://127.0.0.1:8080
    pub base_url: String,
    // 单次请求超时 (秒)
    pub timeout_secs: u64,
    pub user_agent: String,
}

/// 调度器与滚动窗口参数
///
/// # Invariants
/// - `min_interval_secs <= max_interval_secs`，服务端下发的刷新间隔会被夹到该区间。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    // 拉取失败后的固定重试延迟 (秒)
    pub retry_delay_secs: u64,
    // 每个标的滚动窗口的容量
    pub window_capacity: usize,
    // 涨跌幅合理性上限 (百分比绝对值)
    pub max_abs_change: f64,
    // 纵轴上下边距
    pub axis_margin: f64,
    pub min_interval_secs: u64,
    pub max_interval_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    // 滚动日志文件目录
    pub dir: String,
    // EnvFilter 语法，RUST_LOG 优先
    pub filter: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            timeout_secs: 10,
            user_agent: "fundwatch/0.1".to_string(),
        }
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            retry_delay_secs: 5,
            window_capacity: 50,
            max_abs_change: 100.0,
            axis_margin: 0.05,
            min_interval_secs: 1,
            max_interval_secs: 3600,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: "logs".to_string(),
            filter: "info".to_string(),
        }
    }
}

impl MonitorSettings {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// # Summary
    /// 把服务端下发的刷新间隔换算为定时器周期。
    ///
    /// # Logic
    /// 夹到 `[min_interval_secs, max_interval_secs]`，避免 0 周期的定时器。
    pub fn refresh_period(&self, refresh_interval_secs: u64) -> Duration {
        let lo = self.min_interval_secs.max(1);
        let hi = self.max_interval_secs.max(lo);
        Duration::from_secs(refresh_interval_secs.clamp(lo, hi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.feed.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.monitor.retry_delay_secs, 5);
        assert_eq!(config.monitor.window_capacity, 50);
        assert_eq!(config.monitor.max_abs_change, 100.0);
        assert_eq!(config.log.dir, "logs");
    }

    #[test]
    fn test_refresh_period_clamped() {
        let settings = MonitorSettings::default();
        assert_eq!(settings.refresh_period(30), Duration::from_secs(30));
        assert_eq!(settings.refresh_period(0), Duration::from_secs(1));
        assert_eq!(settings.refresh_period(100_000), Duration::from_secs(3600));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"feed":{"base_url":"http://x"}}"#).unwrap();
        assert_eq!(config.feed.base_url, "http://x");
        assert_eq!(config.feed.timeout_secs, 10);
        assert_eq!(config.monitor, MonitorSettings::default());
    }
}
