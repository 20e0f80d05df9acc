use axum::Router;
use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use fundwatch_core::common::InstrumentId;
use fundwatch_core::config::FeedConfig;
use fundwatch_core::market::entity::DataPayload;
use fundwatch_core::market::error::FeedError;
use fundwatch_core::market::port::{DashboardApi, FetchKind};
use fundwatch_feed::http::HttpDashboardApi;
use serde_json::json;
use std::collections::HashMap;
use tokio::net::TcpListener;

async fn get_data(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    let incremental = params.get("incremental").map(String::as_str) == Some("true");
    if incremental {
        axum::Json(json!({
            "success": true,
            "data": {
                "time": "10:00:35",
                "indices": [{"name": "上证指数", "code": "sh000001", "current_price": 3015.0, "pre_close": 3000.0, "change": 0.5}],
                "funds": [],
                "errors": ["基金000001数据获取失败"],
                "metrics": {"rising": {"indices": 1, "funds": 0, "total": 1}},
                "incremental_data": {"indices": {"上证指数": 0.5}, "funds": {}},
                "refresh_interval": 15
            }
        }))
    } else {
        axum::Json(json!({
            "success": true,
            "data": {
                "time": "10:00:05",
                "indices": [{"name": "上证指数", "code": "sh000001", "current_price": 3012.6, "pre_close": 3000.0, "change": 0.42}],
                "funds": [{"code": "161725", "name": "招商中证白酒", "net_value": "1.0000", "estimate_value": "1.0250", "update_time": "14:30", "change": 2.5}],
                "errors": [],
                "metrics": {},
                "history": {"time": ["10:00:05"], "index_data": {"上证指数": [0.42]}, "fund_data": {"161725": [2.5]}},
                "refresh_interval": 30,
                "last_update_time": null
            }
        }))
    }
}

async fn get_config() -> impl IntoResponse {
    axum::Json(json!({
        "success": true,
        "config": {"indices": "上证指数|sh000001\n深证成指|sz399001", "funds": "161725 000001", "refresh_interval": 20}
    }))
}

async fn get_advice() -> impl IntoResponse {
    axum::Json(json!({
        "success": true,
        "advice": {"summary": "市场整体偏强", "strategies": ["逢低布局"], "risk_warning": "投资有风险"}
    }))
}

async fn server_error() -> impl IntoResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        axum::Json(json!({"success": false, "message": "服务器内部错误"})),
    )
}

async fn business_failure() -> impl IntoResponse {
    axum::Json(json!({"success": false, "message": "暂无建议"}))
}

/// 启动一个本地夹具服务，返回其地址。
async fn spawn_fixture(router: Router) -> anyhow::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            eprintln!("fixture server stopped: {}", e);
        }
    });
    Ok(format!("http://{}/", addr))
}

fn client(base_url: String) -> anyhow::Result<HttpDashboardApi> {
    // 进程级 provider 只能安装一次，后续测试会得到 Err
    let _already_installed = rustls::crypto::ring::default_provider()
        .install_default()
        .is_err();
    let config = FeedConfig {
        base_url,
        ..FeedConfig::default()
    };
    Ok(HttpDashboardApi::new(&config)?)
}

fn healthy_router() -> Router {
    Router::new()
        .route("/api/get_data", get(get_data))
        .route("/api/get_config", get(get_config))
        .route("/api/get_invest_advice", get(get_advice))
}

/// # Summary
/// 快照请求携带 `incremental=false`，并解码出标的与历史矩阵。
#[tokio::test]
async fn test_fetch_snapshot() -> anyhow::Result<()> {
    let api = client(spawn_fixture(healthy_router()).await?)?;

    let payload = api.fetch_data(FetchKind::Snapshot).await?;
    let DataPayload::Snapshot(snapshot) = payload else {
        panic!("expected snapshot payload");
    };
    assert_eq!(snapshot.time, "10:00:05");
    assert_eq!(snapshot.instruments.len(), 2);
    assert_eq!(snapshot.refresh_interval_secs, 30);
    assert_eq!(
        snapshot.history.values[&InstrumentId::fund("161725")],
        vec![2.5]
    );
    let fund = &snapshot.instruments[1];
    assert!((fund.change_amount - 0.025).abs() < 1e-9);
    Ok(())
}

/// # Summary
/// 增量请求携带 `incremental=true`，错误列表与刷新间隔原样带回。
#[tokio::test]
async fn test_fetch_delta() -> anyhow::Result<()> {
    let api = client(spawn_fixture(healthy_router()).await?)?;

    let payload = api.fetch_data(FetchKind::Incremental).await?;
    let DataPayload::Delta(delta) = payload else {
        panic!("expected delta payload");
    };
    assert_eq!(delta.timestamp, "10:00:35");
    assert_eq!(delta.per_key_value[&InstrumentId::index("上证指数")], 0.5);
    assert_eq!(delta.errors.len(), 1);
    assert_eq!(delta.refresh_interval_secs, 15);
    assert_eq!(delta.metrics.rising.and_then(|r| r.indices), Some(1));
    Ok(())
}

#[tokio::test]
async fn test_fetch_config_and_advice() -> anyhow::Result<()> {
    let api = client(spawn_fixture(healthy_router()).await?)?;

    let config = api.fetch_config().await?;
    assert_eq!(config.indices.len(), 2);
    assert_eq!(config.funds, vec!["161725", "000001"]);
    assert_eq!(config.refresh_interval_secs, 20);

    let advice = api.fetch_advice().await?;
    assert_eq!(advice.summary.as_deref(), Some("市场整体偏强"));
    assert_eq!(advice.strategies, vec!["逢低布局"]);
    Ok(())
}

/// # Summary
/// 非 2xx 状态码是可重试的传输错误，`success:false` 是不可重试的负载错误。
#[tokio::test]
async fn test_error_classification() -> anyhow::Result<()> {
    let router = Router::new()
        .route("/api/get_data", get(server_error))
        .route("/api/get_invest_advice", get(business_failure));
    let api = client(spawn_fixture(router).await?)?;

    let err = api.fetch_data(FetchKind::Snapshot).await.unwrap_err();
    assert!(matches!(err, FeedError::Transport(_)));
    assert!(err.is_retryable());

    let err = api.fetch_advice().await.unwrap_err();
    assert_eq!(err, FeedError::Payload("暂无建议".into()));
    assert!(!err.is_retryable());

    // 未注册的路由返回 404
    let err = api.fetch_config().await.unwrap_err();
    assert!(err.is_retryable());
    Ok(())
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let api = client(format!("http://{}", addr))?;
    let err = api.fetch_data(FetchKind::Incremental).await.unwrap_err();
    assert!(matches!(err, FeedError::Transport(_)));
    Ok(())
}
