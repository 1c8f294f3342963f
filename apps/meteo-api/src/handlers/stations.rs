//! 站点查询 handlers
//!
//! - GET /restq/stations/desc
//! - GET /restq/stations/newest

use crate::AppState;
use crate::utils::response::station_to_dto;
use api_contract::StationDto;
use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use chrono::Local;
use domain::StatRecord;
use std::collections::BTreeMap;
use tracing::info;

/// 站点描述：uid → 站点元数据与频道 ID 表。
pub async fn stations_desc(State(state): State<AppState>) -> Response {
    info!(target: "meteo.api", "stations_desc");
    let stations = state.catalog.discover().await;
    let data: BTreeMap<String, StationDto> = stations
        .into_iter()
        .map(|(uid, station)| (uid, station_to_dto(station)))
        .collect();
    Json(data).into_response()
}

/// 当日速览：每个站点每个频道今天的 min/max/avg 与当前值。
pub async fn stations_newest(State(state): State<AppState>) -> Response {
    info!(target: "meteo.api", "stations_newest");
    let stations = state.catalog.discover().await;
    let now_ts = Local::now().timestamp();

    let mut result: BTreeMap<String, BTreeMap<String, StatRecord>> = BTreeMap::new();
    for (uid, station) in stations {
        let station_key = station.station_key();
        let mut station_data = BTreeMap::new();
        for channel in station.serie.keys() {
            let record = state
                .series
                .newest(&Local, &station_key, channel, now_ts)
                .await;
            if !record.is_empty() {
                station_data.insert(channel.clone(), record);
            }
        }
        if !station_data.is_empty() {
            result.insert(uid, station_data);
        }
    }
    Json(result).into_response()
}
