//! 基于日志的绘图后端与消息通道，供无图形界面的运行方式使用。

use fundwatch_core::market::entity::SeriesPoint;
use fundwatch_core::notify::error::NotifyError;
use fundwatch_core::notify::port::{MessageLevel, Notifier};
use fundwatch_core::view::entity::ChartLabel;
use fundwatch_core::view::error::RenderError;
use fundwatch_core::view::port::{ChartBackend, Panel, StyleHint};
use std::collections::BTreeSet;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// # Summary
/// 把图表与面板内容写入日志的绘图后端。
///
/// # Invariants
/// - 只记录当前存活的图表 id，销毁未知图表视为错误。
#[derive(Default)]
pub struct ConsoleBackend {
    live: BTreeSet<String>,
}

impl ChartBackend for ConsoleBackend {
    fn create_or_update_chart(
        &mut self,
        chart_id: &str,
        points: &[SeriesPoint],
        style: &StyleHint,
    ) -> Result<(), RenderError> {
        let created = self.live.insert(chart_id.to_string());
        let latest = points.last().map(|p| format!("{}={}", p.time, p.value));
        info!(
            chart = chart_id,
            created,
            points = points.len(),
            color = style.line_color,
            "Chart {}",
            latest.as_deref().unwrap_or("-")
        );
        Ok(())
    }

    fn dispose_chart(&mut self, chart_id: &str) -> Result<(), RenderError> {
        if self.live.remove(chart_id) {
            Ok(())
        } else {
            Err(RenderError::ChartNotFound(chart_id.to_string()))
        }
    }

    fn set_chart_header(
        &mut self,
        chart_id: &str,
        title: &str,
        subtitle: &str,
        label: &ChartLabel,
    ) -> Result<(), RenderError> {
        info!(chart = chart_id, "{} | {} | {}", title, subtitle, label.text);
        Ok(())
    }

    fn set_panel(&mut self, panel: Panel, lines: &[String]) -> Result<(), RenderError> {
        info!(panel = ?panel, "{}", lines.join(" / "));
        Ok(())
    }
}

/// # Summary
/// 基于通道的消息提示，消息由独立的展示任务按级别写入日志。
///
/// # Invariants
/// - 展示任务退出后，发送以 `NotifyError::Channel` 失败。
pub struct ToastNotifier {
    tx: mpsc::UnboundedSender<(MessageLevel, String)>,
}

impl ToastNotifier {
    /// # Summary
    /// 创建消息通道。
    ///
    /// # Returns
    /// 发送端与待交给 `display_toasts` 的接收端。
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<(MessageLevel, String)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ToastNotifier {
    fn notify(&self, level: MessageLevel, message: &str) -> Result<(), NotifyError> {
        self.tx
            .send((level, message.to_string()))
            .map_err(|e| NotifyError::Channel(format!("toast display closed: {}", e)))
    }
}

/// 逐条展示消息，直到所有发送端被释放。
pub async fn display_toasts(mut rx: mpsc::UnboundedReceiver<(MessageLevel, String)>) {
    while let Some((level, message)) = rx.recv().await {
        match level {
            MessageLevel::Info => info!(toast = true, "{}", message),
            MessageLevel::Warning => warn!(toast = true, "{}", message),
            MessageLevel::Error => error!(toast = true, "{}", message),
        }
    }
}
