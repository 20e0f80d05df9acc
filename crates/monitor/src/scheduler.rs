use crate::view::{build_incremental_view, build_status, build_view_model};
use fundwatch_core::common::time::TimeProvider;
use fundwatch_core::config::MonitorSettings;
use fundwatch_core::market::entity::{
    DataPayload, IncrementalDelta, Instrument, MonitorConfig, Snapshot,
};
use fundwatch_core::market::error::FeedError;
use fundwatch_core::market::port::{DashboardApi, FetchKind};
use fundwatch_core::notify::port::{MessageLevel, Notifier};
use fundwatch_core::view::port::RenderBridge;
use fundwatch_overview::advice::AdviceCache;
use fundwatch_overview::aggregate::aggregate;
use fundwatch_series::store::SeriesStore;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{Instrument as _, Span, debug, info, info_span, warn};
use uuid::Uuid;

/// 尚未配置任何标的时的提示
pub const EMPTY_CONFIG_WARNING: &str = "尚未配置监控标的，请先前往配置中心设置指数和基金代码";

/// # Summary
/// 监控会话层的错误类型。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MonitorError {
    #[error("Scheduler stopped")]
    Stopped,
}

/// # Summary
/// 调度器所处阶段。
///
/// # Invariants
/// - 只会按 `Idle → Loading → Steady` 推进；重置会回到 `Loading`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    // 尚未启动
    Idle,
    // 等待首个 (或重置后的) 快照
    Loading,
    // 已渲染快照，按固定周期轮询增量
    Steady,
}

/// 事件循环处理的消息
#[derive(Debug)]
enum Event {
    Tick,
    Retry(FetchKind),
    Data {
        kind: FetchKind,
        result: Result<DataPayload, FeedError>,
    },
    AdviceReady,
    ConfigChecked(Result<MonitorConfig, FeedError>),
    Reset,
    Shutdown,
}

/// # Summary
/// 调度器依赖的外部协作者，由应用层注入。
pub struct SchedulerDeps {
    pub api: Arc<dyn DashboardApi>,
    pub bridge: Box<dyn RenderBridge>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn TimeProvider>,
    pub settings: MonitorSettings,
}

/// # Summary
/// 运行中调度器的控制句柄，可克隆后在多处使用。
#[derive(Clone)]
pub struct SchedulerHandle {
    tx: mpsc::UnboundedSender<Event>,
    phase: watch::Receiver<Phase>,
    session_id: Arc<str>,
}

impl SchedulerHandle {
    /// # Summary
    /// 硬重置：回到 `Loading`，取消轮询定时器并重新拉取快照。
    ///
    /// # Returns
    /// 事件循环已退出时返回 `MonitorError::Stopped`。
    pub fn reset(&self) -> Result<(), MonitorError> {
        self.tx.send(Event::Reset).map_err(|_| MonitorError::Stopped)
    }

    /// 请求事件循环退出。
    pub fn shutdown(&self) -> Result<(), MonitorError> {
        self.tx.send(Event::Shutdown).map_err(|_| MonitorError::Stopped)
    }

    /// 调度器当前所处阶段。
    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// # Summary
    /// 等待调度器进入指定阶段。
    ///
    /// # Returns
    /// 事件循环在此之前退出时返回 `MonitorError::Stopped`。
    pub async fn wait_for(&mut self, phase: Phase) -> Result<(), MonitorError> {
        self.phase
            .wait_for(|p| *p == phase)
            .await
            .map(|_| ())
            .map_err(|_| MonitorError::Stopped)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// # Summary
/// 单个看板会话的轮询调度器与状态属主。
///
/// # Logic
/// 所有状态变更都在 `run` 的事件循环中串行完成：网络请求在独立任务中执行，
/// 结果以事件形式回送，因此一次响应的 合并 → 聚合 → 渲染 不会被其他响应打断。
///
/// # Invariants
/// - 同一时刻最多只有一个轮询定时器任务存活，重新设定前总是先中止旧任务。
/// - 失败重试是独立的一次性任务，可能与定时器触发交错，后到的响应覆盖先到的。
/// - 每个实例独占自己的存储、渲染桥、建议缓存与定时器，多个会话互不影响。
pub struct Scheduler {
    session_id: Arc<str>,
    phase: Phase,
    api: Arc<dyn DashboardApi>,
    bridge: Box<dyn RenderBridge>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn TimeProvider>,
    settings: MonitorSettings,
    store: SeriesStore,
    advice: Arc<AdviceCache>,
    // 最近一次下发的标的展示数据
    instruments: Vec<Instrument>,
    // 当前定时器的周期及其任务句柄
    timer: Option<(Duration, AbortHandle)>,
    tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
    phase_tx: watch::Sender<Phase>,
}

impl Scheduler {
    /// # Summary
    /// 创建调度器及其控制句柄。
    ///
    /// # Logic
    /// 1. 生成会话 id (uuid v4)，附加到本会话的所有日志上。
    /// 2. 按配置初始化滚动窗口存储与建议缓存。
    ///
    /// # Arguments
    /// * `deps`: 注入的外部协作者与参数。
    ///
    /// # Returns
    /// 处于 `Idle` 阶段的调度器与其句柄。
    pub fn new(deps: SchedulerDeps) -> (Self, SchedulerHandle) {
        let session_id: Arc<str> = Uuid::new_v4().to_string().into();
        let (tx, rx) = mpsc::unbounded_channel();
        let (phase_tx, phase_rx) = watch::channel(Phase::Idle);

        let handle = SchedulerHandle {
            tx: tx.clone(),
            phase: phase_rx,
            session_id: session_id.clone(),
        };

        let scheduler = Self {
            session_id,
            phase: Phase::Idle,
            advice: Arc::new(AdviceCache::new(deps.api.clone())),
            api: deps.api,
            bridge: deps.bridge,
            notifier: deps.notifier,
            clock: deps.clock,
            store: SeriesStore::from_settings(&deps.settings),
            settings: deps.settings,
            instruments: Vec::new(),
            timer: None,
            tx,
            rx,
            phase_tx,
        };
        (scheduler, handle)
    }

    /// # Summary
    /// 启动会话。
    ///
    /// # Logic
    /// 1. `Idle → Loading`。
    /// 2. 发起快照请求与首次投资建议请求。
    /// 3. 发起一次配置检查，只影响提示消息，不影响调度。
    pub fn start(&mut self) {
        if self.phase != Phase::Idle {
            debug!("Scheduler already started ({:?})", self.phase);
            return;
        }
        self.set_phase(Phase::Loading);
        self.fetch(FetchKind::Snapshot);
        self.fetch_advice();
        self.check_config();
    }

    /// # Summary
    /// 运行事件循环，直到收到关闭请求。
    ///
    /// # Logic
    /// 1. 尚未启动时先调用 `start`。
    /// 2. 逐个处理事件；每个事件在一次同步调用中完成全部状态变更与渲染。
    pub async fn run(mut self) {
        let span = info_span!("monitor", session = %self.session_id);
        async move {
            info!("Monitor session started");
            self.start();
            while let Some(event) = self.rx.recv().await {
                if self.step(event).is_break() {
                    break;
                }
            }
            self.cancel_timer();
            info!("Monitor session stopped");
        }
        .instrument(span)
        .await
    }

    fn step(&mut self, event: Event) -> std::ops::ControlFlow<()> {
        match event {
            Event::Tick => self.on_tick(),
            Event::Retry(kind) => {
                debug!("Retrying {:?} fetch", kind);
                self.fetch(kind);
            }
            Event::Data { kind, result } => self.on_data(kind, result),
            Event::AdviceReady => {
                let latest = self.advice.latest();
                self.bridge.render_advice(latest.as_ref());
            }
            Event::ConfigChecked(result) => self.on_config_checked(result),
            Event::Reset => self.on_reset(),
            Event::Shutdown => return std::ops::ControlFlow::Break(()),
        }
        std::ops::ControlFlow::Continue(())
    }

    fn on_tick(&mut self) {
        if self.phase != Phase::Steady {
            debug!("Ignoring tick while {:?}", self.phase);
            return;
        }
        self.fetch(FetchKind::Incremental);
        self.fetch_advice();
    }

    /// # Summary
    /// 处理一次行情响应。
    ///
    /// # Logic
    /// 1. 快照：任何阶段都按硬重置处理 (后到者覆盖)，进入 `Steady`。
    /// 2. 增量：仅在 `Steady` 阶段合并，其余阶段丢弃。
    /// 3. 响应携带的 `errors` 在状态更新之后以错误消息提示。
    /// 4. 请求失败时提示用户；可重试的错误 (传输错误) 按固定延迟重试同一请求。
    fn on_data(&mut self, kind: FetchKind, result: Result<DataPayload, FeedError>) {
        match result {
            Ok(payload) => {
                let errors = payload.errors().to_vec();
                match payload {
                    DataPayload::Snapshot(snapshot) => self.on_snapshot(snapshot),
                    DataPayload::Delta(delta) if self.phase == Phase::Steady => {
                        self.on_delta(delta)
                    }
                    DataPayload::Delta(_) => {
                        debug!("Dropping delta received while {:?}", self.phase);
                    }
                }
                if !errors.is_empty() {
                    self.notify(
                        MessageLevel::Error,
                        &format!("数据获取异常：\n{}", errors.join("\n")),
                    );
                }
            }
            Err(e) => {
                warn!("{:?} fetch failed: {}", kind, e);
                let message = match &e {
                    FeedError::Transport(detail) => format!("数据加载失败：{}", detail),
                    FeedError::Payload(message) => message.clone(),
                };
                self.notify(MessageLevel::Error, &message);
                if e.is_retryable() {
                    self.schedule_retry(kind);
                }
            }
        }
    }

    fn on_snapshot(&mut self, snapshot: Snapshot) {
        self.store.apply_snapshot(&snapshot);
        self.instruments = snapshot.instruments;

        let view = build_view_model(
            &self.store,
            &self.instruments,
            aggregate(&snapshot.metrics),
        );
        self.bridge.render_full(&view);
        self.render_status(snapshot.refresh_interval_secs);

        self.set_phase(Phase::Steady);
        self.arm_timer(snapshot.refresh_interval_secs);
    }

    fn on_delta(&mut self, delta: IncrementalDelta) {
        let outcome = self.store.apply_delta(&delta);
        debug!(
            "Delta {}: {} appended, {} rejected, {} ignored",
            delta.timestamp,
            outcome.appended.len(),
            outcome.rejected.len(),
            outcome.ignored.len()
        );
        if !delta.instruments.is_empty() {
            self.instruments = delta.instruments;
        }

        let view = build_incremental_view(
            &self.store,
            &self.instruments,
            &delta.timestamp,
            &outcome.appended,
            aggregate(&delta.metrics),
        );
        self.bridge.render_incremental(&view);
        self.render_status(delta.refresh_interval_secs);
        self.arm_timer(delta.refresh_interval_secs);
    }

    fn on_config_checked(&mut self, result: Result<MonitorConfig, FeedError>) {
        match result {
            Ok(config) if config.is_empty() => {
                info!("No instruments configured");
                self.notify(MessageLevel::Warning, EMPTY_CONFIG_WARNING);
            }
            Ok(config) => debug!(
                "Config check passed: {} indices, {} funds",
                config.indices.len(),
                config.funds.len()
            ),
            Err(e) => {
                warn!("Config check failed: {}", e);
                self.notify(MessageLevel::Warning, EMPTY_CONFIG_WARNING);
            }
        }
    }

    fn on_reset(&mut self) {
        info!("Hard reset requested ({:?} -> Loading)", self.phase);
        self.cancel_timer();
        self.set_phase(Phase::Loading);
        self.fetch(FetchKind::Snapshot);
        self.fetch_advice();
    }

    fn render_status(&mut self, refresh_interval_secs: u64) {
        let status = build_status(
            &self.store,
            &self.instruments,
            refresh_interval_secs,
            self.clock.now(),
        );
        self.bridge.render_status(&status);
    }

    fn notify(&self, level: MessageLevel, message: &str) {
        if let Err(e) = self.notifier.notify(level, message) {
            warn!("Failed to deliver {:?} message: {}", level, e);
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            info!("Phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
            self.phase_tx.send_replace(phase);
        }
    }

    /// # Summary
    /// 按服务端下发的间隔设定轮询定时器。
    ///
    /// # Logic
    /// 1. 间隔先夹到配置的区间内。
    /// 2. 与当前定时器周期相同则保持不变。
    /// 3. 否则先中止旧定时器，再启动新定时器；首次触发在一个周期之后。
    fn arm_timer(&mut self, refresh_interval_secs: u64) {
        let period = self.settings.refresh_period(refresh_interval_secs);
        if matches!(self.timer, Some((armed, _)) if armed == period) {
            return;
        }
        self.cancel_timer();

        let tx = self.tx.clone();
        let task = tokio::spawn(
            async move {
                let mut interval = tokio::time::interval_at(Instant::now() + period, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    interval.tick().await;
                    if tx.send(Event::Tick).is_err() {
                        break;
                    }
                }
            }
            .instrument(Span::current()),
        );
        self.timer = Some((period, task.abort_handle()));
        info!("Refresh timer armed every {:?}", period);
    }

    fn cancel_timer(&mut self) {
        if let Some((period, handle)) = self.timer.take() {
            handle.abort();
            debug!("Refresh timer ({:?}) cancelled", period);
        }
    }

    fn fetch(&self, kind: FetchKind) {
        let api = self.api.clone();
        let tx = self.tx.clone();
        tokio::spawn(
            async move {
                let result = api.fetch_data(kind).await;
                if tx.send(Event::Data { kind, result }).is_err() {
                    debug!("Scheduler gone, dropping {:?} response", kind);
                }
            }
            .instrument(Span::current()),
        );
    }

    fn fetch_advice(&self) {
        let advice = self.advice.clone();
        let tx = self.tx.clone();
        tokio::spawn(
            async move {
                let fetched = advice.fetch_and_cache().await;
                debug!("Advice fetch finished (available: {})", fetched.is_some());
                if tx.send(Event::AdviceReady).is_err() {
                    debug!("Scheduler gone, dropping advice");
                }
            }
            .instrument(Span::current()),
        );
    }

    fn check_config(&self) {
        let api = self.api.clone();
        let tx = self.tx.clone();
        tokio::spawn(
            async move {
                let result = api.fetch_config().await;
                if tx.send(Event::ConfigChecked(result)).is_err() {
                    debug!("Scheduler gone, dropping config check");
                }
            }
            .instrument(Span::current()),
        );
    }

    fn schedule_retry(&self, kind: FetchKind) {
        let delay = self.settings.retry_delay();
        let tx = self.tx.clone();
        tokio::spawn(
            async move {
                tokio::time::sleep(delay).await;
                if tx.send(Event::Retry(kind)).is_err() {
                    debug!("Scheduler gone, dropping {:?} retry", kind);
                }
            }
            .instrument(Span::current()),
        );
        debug!("{:?} retry scheduled in {:?}", kind, delay);
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}
