pub mod lenient;
pub mod time;

use serde::{Deserialize, Serialize};
use std::fmt;

/// # Summary
/// 监控标的类别。
///
/// # Invariants
/// - 指数以名称作为 key，基金以基金代码作为 key。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InstrumentKind {
    // 指数 (如 上证指数)
    Index,
    // 基金 (如 161725)
    Fund,
}

impl InstrumentKind {
    /// 图表 id 使用的前缀。
    pub fn prefix(&self) -> &'static str {
        match self {
            InstrumentKind::Index => "index",
            InstrumentKind::Fund => "fund",
        }
    }
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstrumentKind::Index => write!(f, "指数"),
            InstrumentKind::Fund => write!(f, "基金"),
        }
    }
}

/// # Summary
/// 标的的稳定身份标识，由类别与 key 组成。
///
/// # Invariants
/// - 同一轮询周期内，同一 InstrumentId 最多对应一个标的。
/// - 指数名称与基金代码位于不同命名空间，互不冲突。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstrumentId {
    pub kind: InstrumentKind,
    pub key: String,
}

impl InstrumentId {
    pub fn index(name: impl Into<String>) -> Self {
        Self {
            kind: InstrumentKind::Index,
            key: name.into(),
        }
    }

    pub fn fund(code: impl Into<String>) -> Self {
        Self {
            kind: InstrumentKind::Fund,
            key: code.into(),
        }
    }

    /// # Summary
    /// 渲染层使用的图表 id。
    ///
    /// # Returns
    /// 形如 `index_上证指数` 或 `fund_161725` 的字符串。
    pub fn chart_id(&self) -> String {
        format!("{}_{}", self.kind.prefix(), self.key)
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.prefix(), self.key)
    }
}

/// # Summary
/// 涨跌方向，按涨跌幅符号划分。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Direction {
    Rising,
    Falling,
    Flat,
}

impl Direction {
    /// # Summary
    /// 根据涨跌幅数值判定方向。
    ///
    /// # Logic
    /// 大于 0 为上涨，小于 0 为下跌，其余 (含 0 与 NaN) 视为平盘。
    pub fn of(change: f64) -> Self {
        if change > 0.0 {
            Direction::Rising
        } else if change < 0.0 {
            Direction::Falling
        } else {
            Direction::Flat
        }
    }
}
