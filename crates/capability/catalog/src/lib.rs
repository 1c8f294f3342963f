//! 站点目录：从平铺的指标命名空间重建站点与频道集合。
//!
//! 指标名第二段是 `name_uid` 组合键：含 `_` 时按最后一个 `_` 切分，
//! 右侧为 uid、左侧为名称；不含 `_` 时整段即 uid，名称查旧版设备
//! 对照表，查不到则以 uid 代用。目录每次调用都重新发现，不缓存，
//! 频道 ID 因此只是本次调用的视图（见 domain::assign_channel_ids）。

use domain::{assign_channel_ids, Station, DEFAULT_LATITUDE, DEFAULT_LONGITUDE, DEFAULT_TIMEZONE};
use meteo_backend::SeriesBackend;
use meteo_telemetry::{record_backend_query, record_backend_query_failure};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::warn;

/// 站点目录服务。
pub struct StationCatalog {
    backend: Arc<dyn SeriesBackend>,
    prefix: String,
    legacy_devices: BTreeMap<String, String>,
}

impl StationCatalog {
    pub fn new(
        backend: Arc<dyn SeriesBackend>,
        prefix: &str,
        legacy_devices: BTreeMap<String, String>,
    ) -> Self {
        Self {
            backend,
            prefix: prefix.to_string(),
            legacy_devices,
        }
    }

    /// 发现当前命名空间下的全部站点（uid → Station）。
    ///
    /// 后端查询失败降级为空集合，调用方只会观察到"没有站点"。
    pub async fn discover(&self) -> BTreeMap<String, Station> {
        record_backend_query();
        let names = match self.backend.find_names(&format!("{}.*", self.prefix)).await {
            Ok(names) => names,
            Err(err) => {
                record_backend_query_failure();
                warn!(target: "meteo.catalog", error = %err, "station_discovery_failed");
                return BTreeMap::new();
            }
        };

        let mut stations = BTreeMap::new();
        for metric in names {
            let parts: Vec<&str> = metric.split('.').collect();
            if parts.len() < 2 {
                continue;
            }
            let device_name_uid = parts[1];
            let (name, uid) = match device_name_uid.rsplit_once('_') {
                Some((name, uid)) => (name.to_string(), uid.to_string()),
                None => {
                    let uid = device_name_uid.to_string();
                    let name = self
                        .legacy_devices
                        .get(&uid)
                        .cloned()
                        .unwrap_or_else(|| uid.clone());
                    (name, uid)
                }
            };
            stations.entry(uid.clone()).or_insert(Station {
                uid,
                description: format!("{} Weather Station", name),
                name,
                serie: BTreeMap::new(),
                timezone: DEFAULT_TIMEZONE.to_string(),
                longitude: DEFAULT_LONGITUDE,
                latitude: DEFAULT_LATITUDE,
            });
        }

        for station in stations.values_mut() {
            station.serie = assign_channel_ids(&self.discover_channels(&station.station_key()).await);
        }
        stations
    }

    /// 查找单个站点（每次请求都重新发现，ID 不跨调用缓存）。
    pub async fn find_station(&self, uid: &str) -> Option<Station> {
        self.discover().await.remove(uid)
    }

    /// 发现一个站点键下的频道名集合（指标名第三段）。
    async fn discover_channels(&self, station_key: &str) -> BTreeSet<String> {
        record_backend_query();
        let pattern = format!("{}.{}.*", self.prefix, station_key);
        let names = match self.backend.find_names(&pattern).await {
            Ok(names) => names,
            Err(err) => {
                record_backend_query_failure();
                warn!(target: "meteo.catalog", station_key = %station_key, error = %err, "channel_discovery_failed");
                return BTreeSet::new();
            }
        };
        names
            .iter()
            .filter_map(|metric| metric.split('.').nth(2))
            .map(|channel| channel.to_string())
            .collect()
    }
}

/// 从请求参数的 `device_name_uid`（`NAME_UID` 或裸 `UID`）提取短 UID。
pub fn short_uid(device_name_uid: &str) -> &str {
    match device_name_uid.split_once('_') {
        Some((_, uid)) => uid,
        None => device_name_uid,
    }
}
