//! 宽松的反序列化辅助函数。
//!
//! 上游接口会把数值写成字符串 (如基金净值 `"1.2340"`)，也可能缺字段或类型错乱。
//! 这里的函数把"类型不对"降级为 `None` (或 NaN)，避免单个字段拖垮整个响应的解析。

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// # Summary
/// 将任意 JSON 值尽力转换为 f64。
///
/// # Logic
/// 数字直接取值；字符串去除空白后解析；其余类型返回 None。
pub fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// 可选浮点字段：缺失、null、无法解析均视为 None。
pub fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_f64))
}

/// 必填浮点字段：无法解析时填入 NaN，交由下游校验剔除。
pub fn f64_or_nan<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_f64).unwrap_or(f64::NAN))
}

/// 可选计数字段：只接受非负整数，其余视为 None。
pub fn opt_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok()))
}

/// 可选字符串字段：数字会被转换为其文本形式，其余类型视为 None。
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// 可选嵌套对象：结构不匹配时视为 None，而不是让外层解析失败。
pub fn opt_struct<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "opt_f64")]
        a: Option<f64>,
        #[serde(default, deserialize_with = "opt_count")]
        n: Option<u32>,
        #[serde(default = "nan", deserialize_with = "f64_or_nan")]
        v: f64,
    }

    fn nan() -> f64 {
        f64::NAN
    }

    #[test]
    fn test_lenient_numbers() {
        let p: Probe = serde_json::from_str(r#"{"a":"1.2340","n":3,"v":2.5}"#).unwrap();
        assert_eq!(p.a, Some(1.234));
        assert_eq!(p.n, Some(3));
        assert_eq!(p.v, 2.5);

        let p: Probe = serde_json::from_str(r#"{"a":[1],"n":-2,"v":"abc"}"#).unwrap();
        assert_eq!(p.a, None);
        assert_eq!(p.n, None);
        assert!(p.v.is_nan());

        let p: Probe = serde_json::from_str("{}").unwrap();
        assert_eq!(p.a, None);
        assert!(p.v.is_nan());
    }
}
