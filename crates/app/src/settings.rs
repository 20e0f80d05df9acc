use config::{Config, ConfigError, Environment, File};
use fundwatch_core::config::{AppConfig, LogConfig};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// 环境变量前缀，如 `FUNDWATCH__FEED__BASE_URL`
const ENV_PREFIX: &str = "FUNDWATCH";

/// # Summary
/// 加载应用配置。
///
/// # Logic
/// 1. 读取配置文件 (可缺省，格式按扩展名推断)。
/// 2. 叠加 `FUNDWATCH__` 前缀的环境变量，层级以 `__` 分隔。
/// 3. 未出现的字段取默认值。
///
/// # Arguments
/// * `path`: 配置文件路径。
///
/// # Returns
/// 合并后的配置；文件存在但无法解析时返回错误。
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    Config::builder()
        .add_source(File::from(path).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}

/// # Summary
/// 初始化全局日志：终端输出 + 按天滚动的文件输出。
///
/// # Logic
/// 过滤规则优先取 `RUST_LOG`，否则使用配置中的 `filter`。
///
/// # Returns
/// 文件写入线程的守卫，需在 `main` 结束前一直持有。
pub fn init_tracing(log: &LogConfig) -> Result<WorkerGuard, InitError> {
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("fundwatch")
        .filename_suffix("log")
        .build(&log.dir)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .init();
    Ok(guard)
}
