//! 系统端点 handlers
//!
//! - GET /health
//! - GET /globals/version
//! - GET /metrics

use crate::AppState;
use api_contract::{HealthDto, MetricsSnapshotDto, VersionDto};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Local;
use meteo_telemetry::metrics;
use std::collections::BTreeMap;
use tracing::info;

/// 对外公布的服务版本。
pub const SERVICE_VERSION: &str = "2.0.0";
/// 版本发布日期。
pub const SERVICE_DATE: &str = "2025-11-23";

/// 健康检查：带后端连通性探测，供监控与负载均衡使用。
pub async fn health(State(state): State<AppState>) -> Response {
    let backend_status = match state.backend.probe().await {
        Ok(()) => "healthy",
        Err(_) => "unhealthy",
    };
    let status = if backend_status == "healthy" {
        "healthy"
    } else {
        "degraded"
    };

    let mut services = BTreeMap::new();
    services.insert("backend".to_string(), backend_status.to_string());
    let body = HealthDto {
        status: status.to_string(),
        timestamp: Local::now().to_rfc3339(),
        version: SERVICE_VERSION.to_string(),
        services,
    };
    let code = if status == "healthy" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(body)).into_response()
}

/// 版本端点（兼容旧前端）。
pub async fn version() -> Response {
    info!(target: "meteo.api", "version");
    Json(VersionDto {
        version: SERVICE_VERSION.to_string(),
        date: SERVICE_DATE.to_string(),
    })
    .into_response()
}

/// Telemetry 计数器快照。
pub async fn get_metrics() -> Response {
    let snapshot = metrics().snapshot();
    Json(MetricsSnapshotDto {
        raw_messages: snapshot.raw_messages,
        stat_reports: snapshot.stat_reports,
        binary_frames: snapshot.binary_frames,
        decode_failures: snapshot.decode_failures,
        write_success: snapshot.write_success,
        write_failure: snapshot.write_failure,
        backend_queries: snapshot.backend_queries,
        backend_query_failures: snapshot.backend_query_failures,
    })
    .into_response()
}
