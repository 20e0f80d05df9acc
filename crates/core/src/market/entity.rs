use crate::common::lenient;
use crate::common::{InstrumentId, InstrumentKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// # Summary
/// 单个监控标的 (指数或基金) 在某一轮询周期的展示数据。
///
/// # Invariants
/// - 每个周期整体替换，不做字段级合并。
/// - 基金的 `change_amount` 等于 `estimate_value - net_value`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    // 身份标识
    pub id: InstrumentId,
    // 展示名称 (基金名称缺失时回退为代码)
    pub display_name: String,
    // 涨跌幅，单位为百分比
    pub change_percent: f64,
    // 涨跌额，指数为点数，基金为元
    pub change_amount: f64,
    // 类别相关的报价字段
    pub quote: Quote,
}

/// # Summary
/// 标的类别相关的报价信息。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Quote {
    Index {
        // 当前点位
        current_price: f64,
        // 昨收点位
        pre_close: f64,
    },
    Fund {
        // 单位净值
        net_value: f64,
        // 估算净值
        estimate_value: f64,
        // 估值时间
        update_time: String,
    },
}

impl Instrument {
    /// # Summary
    /// 构造一个指数标的。
    ///
    /// # Logic
    /// 涨跌额由当前点位与昨收之差得出，并保留两位小数。
    ///
    /// # Arguments
    /// * `name`: 指数名称，同时作为 key。
    /// * `current_price`: 当前点位。
    /// * `pre_close`: 昨收点位。
    /// * `change_percent`: 涨跌幅 (百分比)。
    ///
    /// # Returns
    /// 指数标的实体。
    pub fn index(
        name: impl Into<String>,
        current_price: f64,
        pre_close: f64,
        change_percent: f64,
    ) -> Self {
        let name = name.into();
        Self {
            id: InstrumentId::index(name.clone()),
            display_name: name,
            change_percent,
            change_amount: ((current_price - pre_close) * 100.0).round() / 100.0,
            quote: Quote::Index {
                current_price,
                pre_close,
            },
        }
    }

    /// # Summary
    /// 构造一个基金标的。
    ///
    /// # Logic
    /// 涨跌额由估算净值减去单位净值得出；名称为空时使用基金代码。
    ///
    /// # Arguments
    /// * `code`: 基金代码，同时作为 key。
    /// * `name`: 基金名称。
    /// * `net_value`: 单位净值。
    /// * `estimate_value`: 估算净值。
    /// * `change_percent`: 估算涨跌幅 (百分比)。
    /// * `update_time`: 估值时间。
    ///
    /// # Returns
    /// 基金标的实体。
    pub fn fund(
        code: impl Into<String>,
        name: impl Into<String>,
        net_value: f64,
        estimate_value: f64,
        change_percent: f64,
        update_time: impl Into<String>,
    ) -> Self {
        let code = code.into();
        let name = name.into();
        let display_name = if name.trim().is_empty() {
            code.clone()
        } else {
            name
        };
        Self {
            id: InstrumentId::fund(code),
            display_name,
            change_percent,
            change_amount: estimate_value - net_value,
            quote: Quote::Fund {
                net_value,
                estimate_value,
                update_time: update_time.into(),
            },
        }
    }

    pub fn kind(&self) -> InstrumentKind {
        self.id.kind
    }
}

/// # Summary
/// 滚动窗口中的一个数据点。
///
/// # Invariants
/// - `time` 为展示用字符串，仅表达到达顺序。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub time: String,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(time: impl Into<String>, value: f64) -> Self {
        Self {
            time: time.into(),
            value,
        }
    }
}

/// # Summary
/// 快照携带的历史矩阵：一条共享时间轴 + 每个标的的数值序列。
///
/// # Invariants
/// - 时间轴为展示用字符串，按到达顺序排列，不做时间解析。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryMatrix {
    pub time: Vec<String>,
    pub values: BTreeMap<InstrumentId, Vec<f64>>,
}

/// # Summary
/// 全量快照：首次加载或硬重置时使用。
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    // 服务端生成快照的时间
    pub time: String,
    pub instruments: Vec<Instrument>,
    pub history: HistoryMatrix,
    pub metrics: RawMetrics,
    // 服务端指定的刷新间隔 (秒)，用于设置轮询定时器
    pub refresh_interval_secs: u64,
    pub errors: Vec<String>,
    pub last_update_time: Option<String>,
}

/// # Summary
/// 增量数据：轮询阶段单个时间点的新数值。
///
/// # Invariants
/// - `per_key_value` 仅包含本周期取到数值的标的。
/// - `instruments` 只用于刷新展示字段，不会触碰滚动窗口。
#[derive(Debug, Clone, PartialEq)]
pub struct IncrementalDelta {
    pub timestamp: String,
    pub per_key_value: BTreeMap<InstrumentId, f64>,
    pub instruments: Vec<Instrument>,
    pub metrics: RawMetrics,
    pub refresh_interval_secs: u64,
    pub errors: Vec<String>,
}

/// # Summary
/// `/api/get_data` 的两种负载形态。
#[derive(Debug, Clone, PartialEq)]
pub enum DataPayload {
    Snapshot(Snapshot),
    Delta(IncrementalDelta),
}

impl DataPayload {
    pub fn errors(&self) -> &[String] {
        match self {
            DataPayload::Snapshot(s) => &s.errors,
            DataPayload::Delta(d) => &d.errors,
        }
    }
}

/// # Summary
/// 某一涨跌方向的原始计数，任意字段都可能缺失。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCounts {
    #[serde(default, deserialize_with = "lenient::opt_count")]
    pub indices: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_count")]
    pub funds: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_count")]
    pub total: Option<u32>,
}

/// # Summary
/// 原始极值 (最大涨幅/最大跌幅)，`value` 为 null 表示本周期无数据。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawExtreme {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub value: Option<f64>,
}

/// # Summary
/// 服务端下发的原始概览指标。
///
/// # Invariants
/// - 所有字段均可缺失；结构错乱的字段按缺失处理，绝不导致整体解析失败。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMetrics {
    #[serde(default, deserialize_with = "lenient::opt_struct")]
    pub rising: Option<RawCounts>,
    #[serde(default, deserialize_with = "lenient::opt_struct")]
    pub falling: Option<RawCounts>,
    #[serde(default, deserialize_with = "lenient::opt_struct")]
    pub flat: Option<RawCounts>,
    #[serde(default, deserialize_with = "lenient::opt_struct")]
    pub max_rise: Option<RawExtreme>,
    #[serde(default, deserialize_with = "lenient::opt_struct")]
    pub max_fall: Option<RawExtreme>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub risk_level: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub avg_change: Option<f64>,
}

/// # Summary
/// 投资建议包，独立于行情轮询获取与缓存。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdviceBundle {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub summary: Option<String>,
    #[serde(default)]
    pub strategies: Vec<String>,
    #[serde(default)]
    pub risk_warning: String,
}

/// # Summary
/// 指数配置项，来自配置文本中的一行 `名称|代码`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub name: String,
    pub code: String,
}

/// # Summary
/// 服务端的监控配置 (`/api/get_config`)。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub indices: Vec<IndexEntry>,
    pub funds: Vec<String>,
    pub refresh_interval_secs: u64,
}

impl MonitorConfig {
    /// # Summary
    /// 解析服务端的文本格式配置。
    ///
    /// # Logic
    /// 1. 指数文本按行拆分，每行形如 `名称|代码`，名称与代码都不能为空，格式错误的行被忽略。
    /// 2. 基金文本按空白拆分为代码列表。
    ///
    /// # Arguments
    /// * `indices_text`: 指数配置文本。
    /// * `funds_text`: 基金配置文本。
    /// * `refresh_interval_secs`: 刷新间隔 (秒)。
    ///
    /// # Returns
    /// 解析后的配置。
    pub fn parse(indices_text: &str, funds_text: &str, refresh_interval_secs: u64) -> Self {
        let indices = indices_text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| {
                let Some((name, code)) = line.trim().split_once('|') else {
                    debug!("Ignoring malformed index config line: {}", line);
                    return None;
                };
                let (name, code) = (name.trim(), code.trim());
                (!name.is_empty() && !code.is_empty()).then(|| IndexEntry {
                    name: name.to_string(),
                    code: code.to_string(),
                })
            })
            .collect();

        let funds = funds_text
            .split_whitespace()
            .map(str::to_string)
            .collect();

        Self {
            indices,
            funds,
            refresh_interval_secs,
        }
    }

    /// 是否一个监控标的都没有配置。
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty() && self.funds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fund_change_amount_and_name_fallback() {
        let fund = Instrument::fund("161725", " ", 1.0, 1.025, 2.5, "2024-01-02 14:30");
        assert_eq!(fund.display_name, "161725");
        assert!((fund.change_amount - 0.025).abs() < 1e-9);
        assert_eq!(fund.kind(), InstrumentKind::Fund);
    }

    #[test]
    fn test_index_change_amount_rounding() {
        let idx = Instrument::index("上证指数", 3012.456, 3000.0, 0.41);
        assert_eq!(idx.change_amount, 12.46);
    }

    #[test]
    fn test_monitor_config_parse() {
        let cfg = MonitorConfig::parse(
            "上证指数|sh000001\n bad line \n深证成指 | sz399001\n|x\n",
            "000001  025857\n161725",
            30,
        );
        assert_eq!(cfg.indices.len(), 2);
        assert_eq!(cfg.indices[1].name, "深证成指");
        assert_eq!(cfg.indices[1].code, "sz399001");
        assert_eq!(cfg.funds, vec!["000001", "025857", "161725"]);
        assert!(!cfg.is_empty());
        assert!(MonitorConfig::parse("", " ", 30).is_empty());
    }

    #[test]
    fn test_raw_metrics_tolerates_garbage() {
        let raw: RawMetrics = serde_json::from_str(
            r#"{"rising":"oops","falling":{"indices":1,"funds":"x","total":-1},
                "max_rise":{"name":"A","value":null},"risk_level":42}"#,
        )
        .unwrap();
        assert_eq!(raw.rising, None);
        let falling = raw.falling.unwrap();
        assert_eq!(falling.indices, Some(1));
        assert_eq!(falling.funds, None);
        assert_eq!(falling.total, None);
        assert_eq!(raw.max_rise.unwrap().value, None);
        assert_eq!(raw.risk_level.as_deref(), Some("42"));
    }
}
