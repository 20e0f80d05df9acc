//! 看板后端 JSON 响应的线上格式。
//!
//! 所有结构都只在本 crate 内可见，解码后立即转换为核心实体。

use fundwatch_core::common::InstrumentId;
use fundwatch_core::common::lenient;
use fundwatch_core::market::entity::{
    AdviceBundle, DataPayload, HistoryMatrix, IncrementalDelta, Instrument, MonitorConfig,
    RawMetrics, Snapshot,
};
use fundwatch_core::market::error::FeedError;
use fundwatch_core::market::port::FetchKind;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

// 服务端未给出刷新间隔时使用的默认值 (秒)
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;

/// # Summary
/// 所有接口共用的响应外壳 `{success, data|config|advice, message}`。
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(alias = "data", alias = "config", alias = "advice")]
    body: Option<T>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    message: Option<String>,
}

impl<T> Envelope<T> {
    /// # Summary
    /// 拆开外壳，取出业务数据。
    ///
    /// # Logic
    /// 1. `success: false` 转为 `FeedError::Payload`，优先使用服务端提示信息。
    /// 2. 成功但缺少业务数据同样视为负载错误。
    ///
    /// # Arguments
    /// * `fallback`: 服务端未给出提示信息时使用的文本。
    pub(crate) fn into_body(self, fallback: &str) -> Result<T, FeedError> {
        if !self.success {
            let message = self
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string());
            return Err(FeedError::Payload(message));
        }
        self.body
            .ok_or_else(|| FeedError::Payload(fallback.to_string()))
    }
}

/// `/api/get_config` 的 `config` 部分
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireConfig {
    #[serde(deserialize_with = "lenient::opt_string")]
    indices: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    funds: Option<String>,
    #[serde(deserialize_with = "lenient::opt_count")]
    refresh_interval: Option<u32>,
}

impl From<WireConfig> for MonitorConfig {
    fn from(wire: WireConfig) -> Self {
        MonitorConfig::parse(
            wire.indices.as_deref().unwrap_or_default(),
            wire.funds.as_deref().unwrap_or_default(),
            refresh_interval(wire.refresh_interval),
        )
    }
}

/// `/api/get_invest_advice` 的 `advice` 部分
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireAdvice {
    #[serde(deserialize_with = "lenient::opt_string")]
    summary: Option<String>,
    #[serde(deserialize_with = "lenient::opt_struct")]
    strategies: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient::opt_string")]
    risk_warning: Option<String>,
}

impl From<WireAdvice> for AdviceBundle {
    fn from(wire: WireAdvice) -> Self {
        AdviceBundle {
            summary: wire.summary.filter(|s| !s.trim().is_empty()),
            strategies: wire.strategies.unwrap_or_default(),
            risk_warning: wire.risk_warning.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireIndex {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    current_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pre_close: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    change: Option<f64>,
}

/// 基金条目，净值类字段经常以字符串下发
#[derive(Debug, Deserialize)]
struct WireFund {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    code: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    net_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    estimate_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    update_time: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    change: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireHistory {
    time: Vec<Value>,
    index_data: BTreeMap<String, Vec<Value>>,
    fund_data: BTreeMap<String, Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireIncremental {
    indices: BTreeMap<String, Value>,
    funds: BTreeMap<String, Value>,
}

/// `/api/get_data` 的 `data` 部分
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireData {
    #[serde(deserialize_with = "lenient::opt_string")]
    time: Option<String>,
    #[serde(deserialize_with = "lenient::opt_struct")]
    indices: Option<Vec<Value>>,
    #[serde(deserialize_with = "lenient::opt_struct")]
    funds: Option<Vec<Value>>,
    #[serde(deserialize_with = "lenient::opt_struct")]
    errors: Option<Vec<Value>>,
    #[serde(deserialize_with = "lenient::opt_struct")]
    metrics: Option<RawMetrics>,
    #[serde(deserialize_with = "lenient::opt_struct")]
    history: Option<WireHistory>,
    #[serde(deserialize_with = "lenient::opt_struct")]
    incremental_data: Option<WireIncremental>,
    #[serde(deserialize_with = "lenient::opt_count")]
    refresh_interval: Option<u32>,
    #[serde(deserialize_with = "lenient::opt_string")]
    last_update_time: Option<String>,
}

impl WireData {
    /// # Summary
    /// 按请求类型转换为快照或增量负载。
    ///
    /// # Logic
    /// 1. 逐条解码指数与基金，单条结构错乱只丢弃该条。
    /// 2. 快照取 `history`，增量取 `incremental_data`，以 `time` 作为新点的时间戳。
    /// 3. 非数值的历史或增量取值转为 NaN，交由存储层的异常过滤剔除。
    ///
    /// # Arguments
    /// * `kind`: 请求时的负载类型。
    ///
    /// # Returns
    /// 与 `kind` 一致的 DataPayload。
    pub(crate) fn into_payload(self, kind: FetchKind) -> DataPayload {
        let mut instruments: Vec<Instrument> = self
            .indices
            .unwrap_or_default()
            .into_iter()
            .filter_map(decode_entry::<WireIndex>)
            .filter_map(index_instrument)
            .collect();
        instruments.extend(
            self.funds
                .unwrap_or_default()
                .into_iter()
                .filter_map(decode_entry::<WireFund>)
                .filter_map(fund_instrument),
        );

        let errors: Vec<String> = self
            .errors
            .unwrap_or_default()
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect();
        let metrics = self.metrics.unwrap_or_default();
        let refresh_interval_secs = refresh_interval(self.refresh_interval);
        let time = self.time.unwrap_or_default();

        match kind {
            FetchKind::Snapshot => {
                let history = self.history.unwrap_or_default();
                let mut values = BTreeMap::new();
                for (name, series) in history.index_data {
                    values.insert(InstrumentId::index(name), to_series(series));
                }
                for (code, series) in history.fund_data {
                    values.insert(InstrumentId::fund(code), to_series(series));
                }

                DataPayload::Snapshot(Snapshot {
                    time,
                    instruments,
                    history: HistoryMatrix {
                        time: history.time.into_iter().map(time_label).collect(),
                        values,
                    },
                    metrics,
                    refresh_interval_secs,
                    errors,
                    last_update_time: self.last_update_time,
                })
            }
            FetchKind::Incremental => {
                let incremental = self.incremental_data.unwrap_or_default();
                let per_key_value = incremental
                    .indices
                    .into_iter()
                    .map(|(name, v)| (InstrumentId::index(name), to_value(&v)))
                    .chain(
                        incremental
                            .funds
                            .into_iter()
                            .map(|(code, v)| (InstrumentId::fund(code), to_value(&v))),
                    )
                    .collect();

                DataPayload::Delta(IncrementalDelta {
                    timestamp: time,
                    per_key_value,
                    instruments,
                    metrics,
                    refresh_interval_secs,
                    errors,
                })
            }
        }
    }
}

fn refresh_interval(raw: Option<u32>) -> u64 {
    raw.map(u64::from).unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS)
}

fn decode_entry<T: serde::de::DeserializeOwned>(value: Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(entry) => Some(entry),
        Err(e) => {
            debug!("Skipping malformed entry: {}", e);
            None
        }
    }
}

fn index_instrument(wire: WireIndex) -> Option<Instrument> {
    let name = wire.name.filter(|n| !n.trim().is_empty())?;
    Some(Instrument::index(
        name,
        wire.current_price.unwrap_or(0.0),
        wire.pre_close.unwrap_or(0.0),
        wire.change.unwrap_or(0.0),
    ))
}

fn fund_instrument(wire: WireFund) -> Option<Instrument> {
    let code = wire.code.filter(|c| !c.trim().is_empty())?;
    Some(Instrument::fund(
        code,
        wire.name.unwrap_or_default(),
        wire.net_value.unwrap_or(0.0),
        wire.estimate_value.unwrap_or(0.0),
        wire.change.unwrap_or(0.0),
        wire.update_time.unwrap_or_default(),
    ))
}

fn to_value(value: &Value) -> f64 {
    lenient::value_to_f64(value).unwrap_or(f64::NAN)
}

fn to_series(values: Vec<Value>) -> Vec<f64> {
    values.iter().map(to_value).collect()
}

fn time_label(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
