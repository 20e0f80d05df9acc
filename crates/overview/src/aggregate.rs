use fundwatch_core::market::entity::{RawCounts, RawExtreme, RawMetrics};
use fundwatch_core::view::entity::{
    DirectionCount, Extreme, OverviewItem, OverviewMetrics, OverviewTone, RiskLevel,
};

/// # Summary
/// 把服务端原始指标归一化为可直接渲染的概览指标。
///
/// # Logic
/// 1. 缺失的计数按 0 补齐，`total` 一律按 `indices + funds` 重新计算。
/// 2. 极值的 `value` 缺失或非有限时视为本周期无数据 (None)。
/// 3. 风险等级缺失或为空白时为 `RiskLevel::Undetermined`。
///
/// # Arguments
/// * `raw`: 服务端原始指标，任意字段都可能缺失。
///
/// # Returns
/// 完整的 `OverviewMetrics`，此函数不会失败。
pub fn aggregate(raw: &RawMetrics) -> OverviewMetrics {
    OverviewMetrics {
        rising: counts(raw.rising.as_ref()),
        falling: counts(raw.falling.as_ref()),
        flat: counts(raw.flat.as_ref()),
        max_rise: extreme(raw.max_rise.as_ref()),
        max_fall: extreme(raw.max_fall.as_ref()),
        risk_level: risk_level(raw.risk_level.as_deref()),
    }
}

fn counts(raw: Option<&RawCounts>) -> DirectionCount {
    raw.map(|c| DirectionCount::new(c.indices.unwrap_or(0), c.funds.unwrap_or(0)))
        .unwrap_or_default()
}

fn extreme(raw: Option<&RawExtreme>) -> Option<Extreme> {
    let raw = raw?;
    let value = raw.value.filter(|v| v.is_finite())?;
    Some(Extreme {
        name: raw.name.clone().unwrap_or_default(),
        value,
    })
}

fn risk_level(raw: Option<&str>) -> RiskLevel {
    match raw.map(str::trim) {
        Some(label) if !label.is_empty() => RiskLevel::Reported(label.to_string()),
        _ => RiskLevel::Undetermined,
    }
}

/// # Summary
/// 生成概览面板的展示项。
///
/// # Logic
/// 依次为 上涨标的、下跌标的、平盘标的、最大涨幅、最大跌幅、市场风险等级；
/// 极值缺失时对应项被省略。
///
/// # Arguments
/// * `metrics`: 归一化后的概览指标。
///
/// # Returns
/// 按展示顺序排列的概览项。
pub fn overview_items(metrics: &OverviewMetrics) -> Vec<OverviewItem> {
    let mut items = vec![
        count_item("上涨标的", &metrics.rising, OverviewTone::Rising),
        count_item("下跌标的", &metrics.falling, OverviewTone::Falling),
        count_item("平盘标的", &metrics.flat, OverviewTone::Neutral),
    ];

    if let Some(max_rise) = &metrics.max_rise {
        items.push(extreme_item("最大涨幅", max_rise, OverviewTone::Rising));
    }
    if let Some(max_fall) = &metrics.max_fall {
        items.push(extreme_item("最大跌幅", max_fall, OverviewTone::Falling));
    }

    items.push(OverviewItem {
        label: "市场风险等级".to_string(),
        value: metrics.risk_level.to_string(),
        desc: None,
        tone: OverviewTone::Warning,
    });
    items
}

fn count_item(label: &str, count: &DirectionCount, tone: OverviewTone) -> OverviewItem {
    OverviewItem {
        label: label.to_string(),
        value: count.total.to_string(),
        desc: Some(format!("指数{} | 基金{}", count.indices, count.funds)),
        tone,
    }
}

fn extreme_item(label: &str, extreme: &Extreme, tone: OverviewTone) -> OverviewItem {
    OverviewItem {
        label: label.to_string(),
        value: format!("{:.2}%", extreme.value),
        desc: (!extreme.name.is_empty()).then(|| extreme.name.clone()),
        tone,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_risk_label_is_undetermined() {
        assert_eq!(risk_level(Some("   ")), RiskLevel::Undetermined);
        assert!(risk_level(None).is_undetermined());
        assert_eq!(
            risk_level(Some(" 低风险（震荡） ")),
            RiskLevel::Reported("低风险（震荡）".into())
        );
    }

    #[test]
    fn test_non_finite_extreme_is_absent() {
        let raw = RawExtreme {
            name: Some("A".into()),
            value: Some(f64::NAN),
        };
        assert_eq!(extreme(Some(&raw)), None);
    }

    #[test]
    fn test_extreme_item_formatting() {
        let item = extreme_item(
            "最大跌幅",
            &Extreme {
                name: String::new(),
                value: -1.234,
            },
            OverviewTone::Falling,
        );
        assert_eq!(item.value, "-1.23%");
        assert_eq!(item.desc, None);
    }
}
