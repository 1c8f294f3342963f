//! 可用日期树 handler
//!
//! - GET /restq/stations/datatree

use crate::AppState;
use axum::{
    Json,
    extract::State,
    http::HeaderValue,
    response::{IntoResponse, Response},
};
use chrono::Local;
use domain::DateTree;
use std::collections::BTreeMap;
use tracing::info;

/// 每个站点每个频道的可用年/月/日集合（固定回看窗口的近似）。
pub async fn stations_datatree(State(state): State<AppState>) -> Response {
    info!(target: "meteo.api", "stations_datatree");
    let stations = state.catalog.discover().await;
    let now_ts = Local::now().timestamp();

    let mut tree: BTreeMap<String, BTreeMap<String, DateTree>> = BTreeMap::new();
    for (uid, station) in stations {
        let station_key = station.station_key();
        let mut station_tree = BTreeMap::new();
        for channel in station.serie.keys() {
            let availability = state
                .series
                .availability(&Local, &station_key, channel, now_ts)
                .await;
            station_tree.insert(channel.clone(), availability);
        }
        tree.insert(uid, station_tree);
    }

    // 日期选择器要拿到当天的最新状态，禁止任何缓存
    let mut response = Json(tree).into_response();
    let headers = response.headers_mut();
    headers.insert(
        "Cache-Control",
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert("Pragma", HeaderValue::from_static("no-cache"));
    headers.insert("Expires", HeaderValue::from_static("0"));
    response
}
