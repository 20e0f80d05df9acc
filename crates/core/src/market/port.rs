use crate::market::entity::{AdviceBundle, DataPayload, MonitorConfig};
use crate::market::error::FeedError;
use async_trait::async_trait;

/// # Summary
/// 请求快照还是增量数据。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKind {
    // 全量快照 (`incremental=false`)
    Snapshot,
    // 增量数据 (`incremental=true`)
    Incremental,
}

impl FetchKind {
    pub fn is_incremental(&self) -> bool {
        matches!(self, FetchKind::Incremental)
    }
}

/// # Summary
/// 看板后端接口契约 (Port)，是引擎唯一的网络出口。
///
/// # Invariants
/// - 实现者只负责一次请求/响应，不做重试与缓存，重试策略由调度器统一管理。
/// - `fetch_data` 返回的负载形态必须与 `kind` 一致。
#[async_trait]
pub trait DashboardApi: Send + Sync {
    /// # Summary
    /// 获取服务端监控配置。
    ///
    /// # Logic
    /// 1. 请求 `/api/get_config`。
    /// 2. 解析文本格式的指数/基金配置。
    ///
    /// # Returns
    /// 成功返回 MonitorConfig，失败返回 FeedError。
    async fn fetch_config(&self) -> Result<MonitorConfig, FeedError>;

    /// # Summary
    /// 获取行情数据。
    ///
    /// # Logic
    /// 1. 请求 `/api/get_data?incremental={bool}`。
    /// 2. 按 `kind` 解码为快照或增量负载。
    ///
    /// # Arguments
    /// * `kind`: 快照或增量。
    ///
    /// # Returns
    /// 成功返回对应形态的 DataPayload。
    async fn fetch_data(&self, kind: FetchKind) -> Result<DataPayload, FeedError>;

    /// # Summary
    /// 获取投资建议。
    ///
    /// # Logic
    /// 1. 请求 `/api/get_invest_advice`。
    ///
    /// # Returns
    /// 成功返回 AdviceBundle。
    async fn fetch_advice(&self) -> Result<AdviceBundle, FeedError>;
}
