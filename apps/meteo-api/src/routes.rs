//! 路由定义
//!
//! 集中管理所有 API 路由，将路径映射到对应的 handlers。
//! 路由包括：
//! - 健康检查：/health
//! - 版本信息：/globals/version
//! - 指标快照：/metrics
//! - 站点描述：/restq/stations/desc
//! - 当日速览：/restq/stations/newest
//! - 可用日期树：/restq/stations/datatree
//! - 序列视图：/restq/station/serie/{daily|monthly|yearly}/{param}

use super::AppState;
use super::handlers::*;
use super::utils::response::not_found;
use axum::{Router, routing::get};

/// 创建 API 路由
///
/// 序列视图的最后一段是 URL 编码的 JSON 参数 `{"uid","serie","date"}`，
/// 用通配段整体捕获。
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/globals/version", get(version))
        .route("/metrics", get(get_metrics))
        .route("/restq/stations/desc", get(stations_desc))
        .route("/restq/stations/newest", get(stations_newest))
        .route("/restq/stations/datatree", get(stations_datatree))
        .route("/restq/station/serie/:resolution/*param", get(station_series))
        .fallback(not_found)
}
