use crate::wire::{Envelope, WireAdvice, WireConfig, WireData};
use async_trait::async_trait;
use fundwatch_core::config::FeedConfig;
use fundwatch_core::market::entity::{AdviceBundle, DataPayload, MonitorConfig};
use fundwatch_core::market::error::FeedError;
use fundwatch_core::market::port::{DashboardApi, FetchKind};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// # Summary
/// 基于 reqwest 的看板后端客户端。
///
/// # Invariants
/// - 每个方法只发起一次请求，不做重试。
/// - 网络失败、非 2xx 状态码与无法解码的响应体一律映射为 `FeedError::Transport`。
#[derive(Clone)]
pub struct HttpDashboardApi {
    client: Client,
    // 去掉末尾斜杠的后端地址
    base_url: String,
}

impl HttpDashboardApi {
    /// # Summary
    /// 创建客户端。
    ///
    /// # Logic
    /// 1. 按配置设置请求超时与 User-Agent。
    /// 2. 初始化 reqwest 客户端 (调用方需事先安装 rustls 加密后端)。
    ///
    /// # Arguments
    /// * `config`: 后端连接配置。
    ///
    /// # Returns
    /// 客户端构建失败时返回 `FeedError::Transport`。
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Envelope<T>, FeedError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);

        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(FeedError::Transport(format!("HTTP {}", resp.status())));
        }

        resp.json::<Envelope<T>>()
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))
    }
}

#[async_trait]
impl DashboardApi for HttpDashboardApi {
    async fn fetch_config(&self) -> Result<MonitorConfig, FeedError> {
        let config = self
            .get::<WireConfig>("/api/get_config", &[])
            .await?
            .into_body("获取配置失败")?;
        Ok(config.into())
    }

    /// # Summary
    /// 拉取行情数据。
    ///
    /// # Logic
    /// 1. 以 `incremental=true|false` 请求 `/api/get_data`。
    /// 2. 拆开响应外壳，按 `kind` 转换为快照或增量。
    async fn fetch_data(&self, kind: FetchKind) -> Result<DataPayload, FeedError> {
        let incremental = if kind.is_incremental() { "true" } else { "false" };
        let data = self
            .get::<WireData>("/api/get_data", &[("incremental", incremental)])
            .await?
            .into_body("数据加载失败")?;
        Ok(data.into_payload(kind))
    }

    async fn fetch_advice(&self) -> Result<AdviceBundle, FeedError> {
        let advice = self
            .get::<WireAdvice>("/api/get_invest_advice", &[])
            .await?
            .into_body("获取投资建议失败")?;
        Ok(advice.into())
    }
}
