//! 序列视图 handler
//!
//! - GET /restq/station/serie/{daily|monthly|yearly}/{param}
//!
//! 最后一段是 URL 编码的 JSON：`{"uid": "NAME_UID 或 UID",
//! "serie": "频道 ID", "date": "YYYY[-MM[-DD]]"}`。参数不合法、站点
//! 或频道未知时一律返回空对象，不返回错误状态。

use crate::AppState;
use crate::utils::response::empty_object;
use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use chrono::Local;
use meteo_catalog::short_uid;
use meteo_series::Resolution;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct SeriesParam {
    pub uid: String,
    /// 频道 ID，历史上既有字符串也有数字形式。
    pub serie: Value,
    pub date: String,
}

impl SeriesParam {
    fn serie_id(&self) -> String {
        match &self.serie {
            Value::String(id) => id.clone(),
            other => other.to_string(),
        }
    }
}

pub async fn station_series(
    State(state): State<AppState>,
    Path((resolution, param)): Path<(String, String)>,
) -> Response {
    info!(target: "meteo.api", resolution = %resolution, param = %param, "station_series");

    let Ok(resolution) = resolution.parse::<Resolution>() else {
        return empty_object();
    };
    let Ok(param) = serde_json::from_str::<SeriesParam>(&param) else {
        return empty_object();
    };

    // 参数里的 uid 可能是组合键，取短 UID 后经目录反查当前名称
    let uid = short_uid(&param.uid);
    let Some(station) = state.catalog.find_station(uid).await else {
        return empty_object();
    };
    let serie_id = param.serie_id();
    let Some(channel) = station.channel_name_for(&serie_id) else {
        warn!(target: "meteo.api", uid = %uid, serie = %serie_id, "unknown_serie_id");
        return empty_object();
    };

    let view = state
        .series
        .view(&Local, &station.station_key(), channel, resolution, &param.date)
        .await;
    Json(view).into_response()
}
