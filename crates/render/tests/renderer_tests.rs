use chrono::{Local, TimeZone};
use fundwatch_core::common::{Direction, InstrumentId};
use fundwatch_core::market::entity::{AdviceBundle, SeriesPoint};
use fundwatch_core::view::entity::{
    ChartLabel, ChartUpdate, ChartView, IncrementalView, InstrumentCounts, OverviewMetrics,
    StatusSummary, ViewModel,
};
use fundwatch_core::view::error::RenderError;
use fundwatch_core::view::port::{ChartBackend, Panel, RenderBridge, StyleHint};
use fundwatch_render::bridge::{ADVICE_PLACEHOLDER, ChartRenderer, EMPTY_CHARTS_TEXT};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Upsert(String, Vec<SeriesPoint>, StyleHint),
    Dispose(String),
    // chart_id, 副标题, 标签文本, 涨跌方向
    Header(String, String, String, String),
}

/// 记录所有调用的绘图后端，可配置为对指定图表报错。
#[derive(Default)]
struct RecordingBackend {
    calls: Vec<Call>,
    panels: BTreeMap<String, Vec<String>>,
    failing_chart: Option<String>,
}

impl RecordingBackend {
    fn upserts(&self) -> Vec<&Call> {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Upsert(..)))
            .collect()
    }

    fn disposes(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Dispose(id) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    fn panel(&self, panel: Panel) -> Vec<String> {
        self.panels
            .get(&format!("{:?}", panel))
            .cloned()
            .unwrap_or_default()
    }
}

impl ChartBackend for RecordingBackend {
    fn create_or_update_chart(
        &mut self,
        chart_id: &str,
        points: &[SeriesPoint],
        style: &StyleHint,
    ) -> Result<(), RenderError> {
        if self.failing_chart.as_deref() == Some(chart_id) {
            return Err(RenderError::Backend("canvas lost".into()));
        }
        self.calls.push(Call::Upsert(
            chart_id.to_string(),
            points.to_vec(),
            style.clone(),
        ));
        Ok(())
    }

    fn dispose_chart(&mut self, chart_id: &str) -> Result<(), RenderError> {
        self.calls.push(Call::Dispose(chart_id.to_string()));
        Ok(())
    }

    fn set_chart_header(
        &mut self,
        chart_id: &str,
        _title: &str,
        subtitle: &str,
        label: &ChartLabel,
    ) -> Result<(), RenderError> {
        self.calls.push(Call::Header(
            chart_id.to_string(),
            subtitle.to_string(),
            label.text.clone(),
            format!("{:?}", label.direction),
        ));
        Ok(())
    }

    fn set_panel(&mut self, panel: Panel, lines: &[String]) -> Result<(), RenderError> {
        self.panels.insert(format!("{:?}", panel), lines.to_vec());
        Ok(())
    }
}

fn chart(name: &str, values: &[f64]) -> ChartView {
    let id = InstrumentId::index(name);
    let points: Vec<SeriesPoint> = values
        .iter()
        .enumerate()
        .map(|(i, v)| SeriesPoint::new(format!("t{}", i), *v))
        .collect();
    let latest = values.last().copied().unwrap_or(0.0);
    ChartView {
        chart_id: id.chart_id(),
        id,
        title: name.to_string(),
        subtitle: "3000 (+0点)".into(),
        label: ChartLabel::of(latest),
        points,
    }
}

fn full_view(charts: Vec<ChartView>) -> ViewModel {
    ViewModel {
        charts,
        overview: OverviewMetrics::default(),
        overview_items: Vec::new(),
    }
}

fn update(name: &str, window: &[(&str, f64)]) -> ChartUpdate {
    let id = InstrumentId::index(name);
    let window: Vec<SeriesPoint> = window
        .iter()
        .map(|(t, v)| SeriesPoint::new(*t, *v))
        .collect();
    let point = window[window.len() - 1].clone();
    ChartUpdate {
        chart_id: id.chart_id(),
        id,
        subtitle: None,
        label: ChartLabel::of(point.value),
        point,
        window,
    }
}

/// # Summary
/// 全量渲染先销毁旧图表再按视图重建。
#[test]
fn test_full_render_disposes_previous_charts() {
    let mut renderer = ChartRenderer::new(RecordingBackend::default(), 0.05);
    renderer.render_full(&full_view(vec![chart("A", &[0.1]), chart("B", &[-0.2])]));
    assert_eq!(renderer.registry().len(), 2);
    assert!(renderer.backend().disposes().is_empty());

    renderer.render_full(&full_view(vec![chart("C", &[0.3])]));
    let mut disposed = renderer.backend().disposes();
    disposed.sort();
    assert_eq!(disposed, vec!["index_A", "index_B"]);
    assert_eq!(renderer.registry().ids().collect::<Vec<_>>(), vec!["index_C"]);
    assert!(renderer.backend().panel(Panel::ChartsPlaceholder).is_empty());
}

/// # Summary
/// 没有任何标的时显示占位提示。
#[test]
fn test_empty_model_renders_placeholder() {
    let mut renderer = ChartRenderer::new(RecordingBackend::default(), 0.05);
    renderer.render_full(&ViewModel::default());
    assert!(renderer.registry().is_empty());
    assert_eq!(
        renderer.backend().panel(Panel::ChartsPlaceholder),
        vec![EMPTY_CHARTS_TEXT.to_string()]
    );
}

/// # Summary
/// 增量渲染原地替换数据，纵轴按窗口重算，不销毁重建。
#[test]
fn test_incremental_updates_in_place() {
    let mut renderer = ChartRenderer::new(RecordingBackend::default(), 0.05);
    renderer.render_full(&full_view(vec![chart("A", &[1.2])]));

    renderer.render_incremental(&IncrementalView {
        timestamp: "t1".into(),
        updates: vec![update("A", &[("t0", 1.2), ("t1", -0.5)])],
        ..IncrementalView::default()
    });

    let backend = renderer.backend();
    assert!(backend.disposes().is_empty());
    let upserts = backend.upserts();
    assert_eq!(upserts.len(), 2);
    let Call::Upsert(id, points, style) = upserts[1] else {
        panic!("expected upsert");
    };
    assert_eq!(id, "index_A");
    assert_eq!(points.len(), 2);
    let axis = style.y_axis.unwrap();
    assert!((axis.min - -0.55).abs() < 1e-9);
    assert!((axis.max - 1.25).abs() < 1e-9);
    // 折线配色沿用创建时的上涨配色
    assert_eq!(style.line_color, "#F53F3F");

    assert_eq!(
        backend.calls.last(),
        Some(&Call::Header(
            "index_A".into(),
            "3000 (+0点)".into(),
            "-0.5%".into(),
            format!("{:?}", Direction::Falling)
        ))
    );
    assert_eq!(renderer.registry().get("index_A").unwrap().points.len(), 2);
}

/// # Summary
/// 更新项携带新副标题时刷新图表头，之后不带副标题的更新沿用它。
#[test]
fn test_incremental_refreshes_subtitle() {
    let mut renderer = ChartRenderer::new(RecordingBackend::default(), 0.05);
    renderer.render_full(&full_view(vec![chart("A", &[0.1])]));

    let mut moved = update("A", &[("t0", 0.1), ("t1", 0.2)]);
    moved.subtitle = Some("3100 (+100点)".into());
    renderer.render_incremental(&IncrementalView {
        timestamp: "t1".into(),
        updates: vec![moved],
        ..IncrementalView::default()
    });
    renderer.render_incremental(&IncrementalView {
        timestamp: "t2".into(),
        updates: vec![update("A", &[("t0", 0.1), ("t1", 0.2), ("t2", 0.3)])],
        ..IncrementalView::default()
    });

    let subtitles: Vec<String> = renderer
        .backend()
        .calls
        .iter()
        .filter_map(|c| match c {
            Call::Header(_, subtitle, ..) => Some(subtitle.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(subtitles, vec!["3000 (+0点)", "3100 (+100点)", "3100 (+100点)"]);
    assert_eq!(
        renderer.registry().get("index_A").unwrap().subtitle,
        "3100 (+100点)"
    );
}

/// # Summary
/// 没有登记图表的更新项被静默跳过。
#[test]
fn test_incremental_skips_unknown_chart() {
    let mut renderer = ChartRenderer::new(RecordingBackend::default(), 0.05);
    renderer.render_full(&full_view(vec![chart("A", &[0.1])]));

    renderer.render_incremental(&IncrementalView {
        timestamp: "t1".into(),
        updates: vec![update("Z", &[("t1", 0.2)])],
        ..IncrementalView::default()
    });
    assert_eq!(renderer.backend().upserts().len(), 1);
    assert!(!renderer.registry().contains("index_Z"));
}

/// # Summary
/// 后端报错只记录日志，其余图表照常渲染。
#[test]
fn test_backend_errors_are_swallowed() {
    let backend = RecordingBackend {
        failing_chart: Some("index_A".into()),
        ..RecordingBackend::default()
    };
    let mut renderer = ChartRenderer::new(backend, 0.05);
    renderer.render_full(&full_view(vec![chart("A", &[0.1]), chart("B", &[0.2])]));
    assert_eq!(renderer.backend().upserts().len(), 1);
    assert_eq!(renderer.registry().len(), 2);
}

#[test]
fn test_status_and_advice_panels() {
    let mut renderer = ChartRenderer::new(RecordingBackend::default(), 0.05);
    renderer.render_status(&StatusSummary {
        last_updated: Local.with_ymd_and_hms(2024, 1, 2, 10, 0, 5).unwrap(),
        point_count: 12,
        instrument_counts: InstrumentCounts {
            indices: 3,
            funds: 2,
        },
        refresh_interval_secs: 30,
    });
    let status = renderer.backend().panel(Panel::Status);
    assert_eq!(status[0], "最后更新时间：2024-01-02 10:00:05");
    assert_eq!(status[2], "自动刷新间隔：30 秒");
    assert_eq!(status[3], "累计数据点：12 个");
    assert_eq!(status[4], "监控标的：指数 3 个 | 基金 2 个");

    renderer.render_advice(None);
    assert_eq!(renderer.backend().panel(Panel::Advice)[0], ADVICE_PLACEHOLDER);

    let advice = AdviceBundle {
        summary: Some("市场整体偏强".into()),
        strategies: vec!["逢低布局".into()],
        risk_warning: "谨慎".into(),
    };
    renderer.render_advice(Some(&advice));
    assert_eq!(
        renderer.backend().panel(Panel::Advice),
        vec!["市场整体偏强", "逢低布局", "⚠️ 风险提示：谨慎"]
    );
}
