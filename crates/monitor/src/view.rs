//! 由滚动窗口与标的展示数据组装视图模型。

use chrono::{DateTime, Local};
use fundwatch_core::common::{InstrumentId, InstrumentKind};
use fundwatch_core::market::entity::{Instrument, Quote};
use fundwatch_core::view::entity::{
    ChartLabel, ChartUpdate, ChartView, IncrementalView, InstrumentCounts, OverviewMetrics,
    StatusSummary, ViewModel,
};
use fundwatch_overview::aggregate::overview_items;
use fundwatch_series::store::SeriesStore;

/// # Summary
/// 组装全量渲染的视图模型。
///
/// # Logic
/// 1. 按标的下发顺序遍历，只为已有窗口的标的生成图表。
/// 2. 最新值标签取标的本周期的涨跌幅。
/// 3. 附带归一化概览指标及其展示项。
///
/// # Arguments
/// * `store`: 滚动窗口存储。
/// * `instruments`: 本周期的标的展示数据。
/// * `overview`: 归一化后的概览指标。
pub fn build_view_model(
    store: &SeriesStore,
    instruments: &[Instrument],
    overview: OverviewMetrics,
) -> ViewModel {
    let charts = instruments
        .iter()
        .filter_map(|instrument| {
            let window = store.window_of(&instrument.id)?;
            Some(ChartView {
                id: instrument.id.clone(),
                chart_id: instrument.id.chart_id(),
                title: instrument.display_name.clone(),
                subtitle: subtitle(instrument),
                label: ChartLabel::of(instrument.change_percent),
                points: window.points(),
            })
        })
        .collect();

    ViewModel {
        charts,
        overview_items: overview_items(&overview),
        overview,
    }
}

/// # Summary
/// 组装增量渲染的视图模型。
///
/// # Logic
/// 1. 只为本次成功追加了新点的标的生成更新项，`point` 取窗口最后一个点，
///    标签按该点数值着色。
/// 2. 标的在本次展示数据中出现时附带新的副标题，否则保留原副标题。
///
/// # Arguments
/// * `store`: 合并增量之后的滚动窗口存储。
/// * `instruments`: 当前的标的展示数据。
/// * `timestamp`: 增量时间戳。
/// * `appended`: 本次追加了新点的标的。
/// * `overview`: 归一化后的概览指标。
pub fn build_incremental_view(
    store: &SeriesStore,
    instruments: &[Instrument],
    timestamp: &str,
    appended: &[InstrumentId],
    overview: OverviewMetrics,
) -> IncrementalView {
    let updates = appended
        .iter()
        .filter_map(|id| {
            let window = store.window_of(id)?;
            let point = window.last()?.clone();
            Some(ChartUpdate {
                id: id.clone(),
                chart_id: id.chart_id(),
                subtitle: instruments.iter().find(|i| &i.id == id).map(subtitle),
                label: ChartLabel::of(point.value),
                point,
                window: window.points(),
            })
        })
        .collect();

    IncrementalView {
        timestamp: timestamp.to_string(),
        updates,
        overview_items: overview_items(&overview),
        overview,
    }
}

/// 组装状态栏信息。
pub fn build_status(
    store: &SeriesStore,
    instruments: &[Instrument],
    refresh_interval_secs: u64,
    now: DateTime<Local>,
) -> StatusSummary {
    let count = |kind| instruments.iter().filter(|i| i.kind() == kind).count();
    StatusSummary {
        last_updated: now,
        point_count: store.point_count(),
        instrument_counts: InstrumentCounts {
            indices: count(InstrumentKind::Index),
            funds: count(InstrumentKind::Fund),
        },
        refresh_interval_secs,
    }
}

/// # Summary
/// 图表副标题。
///
/// # Logic
/// - 指数：`当前点位 (±涨跌点数点)`。
/// - 基金：`代码 | 估值: 估算净值 (±涨跌额元)`，涨跌额保留四位小数。
pub fn subtitle(instrument: &Instrument) -> String {
    let sign = if instrument.change_amount > 0.0 { "+" } else { "" };
    match &instrument.quote {
        Quote::Index { current_price, .. } => {
            format!("{} ({}{}点)", current_price, sign, instrument.change_amount)
        }
        Quote::Fund { estimate_value, .. } => format!(
            "{} | 估值: {:.4} ({}{:.4}元)",
            instrument.id.key, estimate_value, sign, instrument.change_amount
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundwatch_core::market::entity::{HistoryMatrix, IncrementalDelta, RawMetrics, Snapshot};
    use std::collections::BTreeMap;

    fn snapshot() -> Snapshot {
        let mut values = BTreeMap::new();
        values.insert(InstrumentId::index("上证指数"), vec![0.3, 0.42]);
        values.insert(InstrumentId::fund("161725"), vec![2.5]);
        Snapshot {
            time: "t1".into(),
            instruments: vec![
                Instrument::index("上证指数", 3012.6, 3000.0, 0.42),
                Instrument::fund("161725", "招商中证白酒", 1.0, 1.025, 2.5, "14:30"),
                Instrument::fund("000001", "", 1.0, 0.99, -1.0, "14:30"),
            ],
            history: HistoryMatrix {
                time: vec!["t0".into(), "t1".into()],
                values,
            },
            metrics: RawMetrics::default(),
            refresh_interval_secs: 30,
            errors: vec![],
            last_update_time: None,
        }
    }

    #[test]
    fn test_subtitles() {
        let s = snapshot();
        assert_eq!(subtitle(&s.instruments[0]), "3012.6 (+12.6点)");
        assert_eq!(subtitle(&s.instruments[1]), "161725 | 估值: 1.0250 (+0.0250元)");
        assert_eq!(subtitle(&s.instruments[2]), "000001 | 估值: 0.9900 (-0.0100元)");
    }

    #[test]
    fn test_view_model_follows_instrument_order() {
        let s = snapshot();
        let mut store = SeriesStore::new(50, 100.0);
        store.apply_snapshot(&s);

        let view = build_view_model(&store, &s.instruments, OverviewMetrics::default());
        let ids: Vec<&str> = view.charts.iter().map(|c| c.chart_id.as_str()).collect();
        assert_eq!(ids, vec!["index_上证指数", "fund_161725", "fund_000001"]);
        assert_eq!(view.charts[0].points.len(), 2);
        assert_eq!(view.charts[0].label.text, "+0.42%");
        assert!(view.charts[2].points.is_empty());
        assert_eq!(view.overview_items.len(), 4);
    }

    #[test]
    fn test_incremental_view_uses_new_point() {
        let s = snapshot();
        let mut store = SeriesStore::new(50, 100.0);
        store.apply_snapshot(&s);

        let mut per_key_value = BTreeMap::new();
        per_key_value.insert(InstrumentId::index("上证指数"), -0.1);
        per_key_value.insert(InstrumentId::fund("161725"), 2.6);
        let delta = IncrementalDelta {
            timestamp: "t2".into(),
            per_key_value,
            instruments: vec![Instrument::index("上证指数", 2997.0, 3000.0, -0.1)],
            metrics: RawMetrics::default(),
            refresh_interval_secs: 30,
            errors: vec![],
        };
        let outcome = store.apply_delta(&delta);

        let view = build_incremental_view(
            &store,
            &delta.instruments,
            &delta.timestamp,
            &outcome.appended,
            OverviewMetrics::default(),
        );
        assert_eq!(view.updates.len(), 2);
        let update = &view.updates[0];
        assert_eq!(update.point.time, "t2");
        assert_eq!(update.label.text, "-0.1%");
        assert_eq!(update.subtitle.as_deref(), Some("2997 (-3点)"));
        assert_eq!(update.window.len(), 3);
        assert_eq!(update.window.last(), Some(&update.point));
        // 本次未下发展示数据的标的不改副标题
        assert_eq!(view.updates[1].id, InstrumentId::fund("161725"));
        assert_eq!(view.updates[1].subtitle, None);

        let status = build_status(&store, &s.instruments, 30, Local::now());
        assert_eq!(status.point_count, 3);
        assert_eq!(status.instrument_counts.indices, 1);
        assert_eq!(status.instrument_counts.funds, 2);
    }
}
