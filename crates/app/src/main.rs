mod console;
mod settings;

use console::{ConsoleBackend, ToastNotifier, display_toasts};
use fundwatch_core::common::time::RealTimeProvider;
use fundwatch_feed::http::HttpDashboardApi;
use fundwatch_monitor::scheduler::{Scheduler, SchedulerDeps};
use fundwatch_render::bridge::ChartRenderer;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// 未指定时读取的配置文件
const DEFAULT_CONFIG_PATH: &str = "fundwatch.toml";

/// # Summary
/// 应用启动入口，纯粹的 DI 容器。
/// 负责实例化具体实现并注入监控调度器。
///
/// # Logic
/// 1. 加载配置 (第一个命令行参数为配置文件路径)，初始化全局日志。
/// 2. 安装 rustls 加密后端。
/// 3. 实例化基础设施层 (HTTP 后端、日志绘图后端、消息通道及其展示任务)。
/// 4. 构造监控会话并在后台运行。
/// 5. 等待退出信号，关闭会话。
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 配置与日志
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = settings::load_config(&path)?;
    let _log_guard = settings::init_tracing(&config.log)?;
    info!("fundwatch starting, backend {}", config.feed.base_url);

    // 2. 进程级加密后端只能安装一次
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("rustls crypto provider already installed");
    }

    // 3. 基础设施层
    let api = Arc::new(HttpDashboardApi::new(&config.feed)?);
    let bridge = ChartRenderer::new(ConsoleBackend::default(), config.monitor.axis_margin);
    let (notifier, toasts) = ToastNotifier::channel();
    let display = tokio::spawn(display_toasts(toasts));

    // 4. 监控会话
    let (scheduler, handle) = Scheduler::new(SchedulerDeps {
        api,
        bridge: Box::new(bridge),
        notifier: Arc::new(notifier),
        clock: Arc::new(RealTimeProvider),
        settings: config.monitor.clone(),
    });
    info!("Session {} created. Waiting for signals...", handle.session_id());
    let session = tokio::spawn(scheduler.run());

    // 5. 挂起主线程，等待外部退出信号
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting...");
    handle.shutdown()?;
    session.await?;
    // 会话释放后发送端全部关闭，展示任务随之结束
    display.await?;

    Ok(())
}
