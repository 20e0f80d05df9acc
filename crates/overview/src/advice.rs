use fundwatch_core::market::entity::AdviceBundle;
use fundwatch_core::market::port::DashboardApi;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// # Summary
/// 投资建议的获取与缓存。
///
/// # Invariants
/// - 只保留最近一次获取的结果；获取失败时清空缓存，渲染层据此显示占位文本。
/// - 失败永远不会以错误形式返回给调用方。
pub struct AdviceCache {
    api: Arc<dyn DashboardApi>,
    latest: RwLock<Option<AdviceBundle>>,
}

impl AdviceCache {
    pub fn new(api: Arc<dyn DashboardApi>) -> Self {
        Self {
            api,
            latest: RwLock::new(None),
        }
    }

    /// # Summary
    /// 拉取最新的投资建议并写入缓存。
    ///
    /// # Logic
    /// 1. 调用后端接口。
    /// 2. 成功时覆盖缓存；传输或负载错误记录 warn 日志并清空缓存。
    ///
    /// # Returns
    /// 本次获取的建议，失败时为 None。
    pub async fn fetch_and_cache(&self) -> Option<AdviceBundle> {
        let fetched = match self.api.fetch_advice().await {
            Ok(bundle) => {
                debug!("Advice refreshed: {} strategies", bundle.strategies.len());
                Some(bundle)
            }
            Err(e) => {
                warn!("Failed to fetch investment advice: {}", e);
                None
            }
        };

        *self.latest.write().unwrap_or_else(|e| e.into_inner()) = fetched.clone();
        fetched
    }

    /// 最近一次获取的建议，上次获取失败时为 None。
    pub fn latest(&self) -> Option<AdviceBundle> {
        self.latest
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
