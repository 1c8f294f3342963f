//! HTTP API 服务器入口：配置加载、组件装配、路由与请求追踪 ID。

mod handlers;
mod ingest;
mod routes;
mod utils;

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::{self, Next},
    response::Response,
};
use meteo_backend::{GraphiteBackend, SeriesBackend};
use meteo_catalog::StationCatalog;
use meteo_config::AppConfig;
use meteo_series::SeriesService;
use meteo_telemetry::{init_tracing, new_request_ids};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, Instrument};

/// 各 handler 共享的应用状态。
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<StationCatalog>,
    pub series: Arc<SeriesService>,
    /// 健康检查用的后端探针。
    pub backend: Arc<GraphiteBackend>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 分层配置：默认值 < 配置文件 < 环境变量
    let config = AppConfig::load()?;
    // 初始化结构化日志
    init_tracing();

    // 时序后端查询客户端（站点目录与序列服务共用）
    let backend = Arc::new(GraphiteBackend::new(
        &config.backend_url,
        config.query_timeout_seconds,
    )?);
    let query_backend: Arc<dyn SeriesBackend> = backend.clone();
    let catalog = Arc::new(StationCatalog::new(
        query_backend.clone(),
        &config.metric_prefix,
        config.legacy_devices.clone(),
    ));
    let series = Arc::new(SeriesService::new(query_backend, &config.metric_prefix));
    let state = AppState {
        catalog,
        series,
        backend,
    };

    // 采集链路（MQTT → 解码 → 写入后端），未启用时为空操作源
    let _ingest = ingest::spawn_ingest(&config);

    let app = routes::create_api_router()
        .with_state(state)
        // 注入 request_id/trace_id
        .layer(middleware::from_fn(request_context))
        .layer(TraceLayer::new_for_http());

    info!("backend: {}", config.backend_url);
    info!("listening on http://{}", config.http_addr);
    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn request_context(mut req: Request<Body>, next: Next) -> Response {
    // 生成 request_id 与 trace_id，并注入请求扩展与日志
    let ids = new_request_ids();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    req.extensions_mut().insert(ids.clone());

    let span = tracing::info_span!(
        "request",
        request_id = %ids.request_id,
        trace_id = %ids.trace_id,
        method = %method,
        path = %path
    );

    let mut response = next.run(req).instrument(span).await;
    response.headers_mut().insert(
        "x-request-id",
        HeaderValue::from_str(&ids.request_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response.headers_mut().insert(
        "x-trace-id",
        HeaderValue::from_str(&ids.trace_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response
}
