//! HTTP 响应辅助函数和 DTO 转换
//!
//! 设计原则：
//! - 数据端点对坏参数统一返回空 JSON 对象（HTTP 200），缺失的遥测
//!   数据是常态而不是异常
//! - 错误体只用于路由级 404/500

use api_contract::{ErrorBody, StationDto};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use domain::Station;

/// 空对象响应（坏参数 / 未知站点或频道的统一降级）。
pub fn empty_object() -> Response {
    Json(serde_json::json!({})).into_response()
}

/// 404 错误响应。
pub async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody::new(
            "Not Found",
            "The requested resource was not found",
            404,
        )),
    )
        .into_response()
}

/// Station 转 StationDto。
pub fn station_to_dto(station: Station) -> StationDto {
    StationDto {
        uid: station.uid,
        name: station.name,
        serie: station.serie,
        description: station.description,
        timezone: station.timezone,
        longitude: station.longitude,
        latitude: station.latitude,
    }
}
