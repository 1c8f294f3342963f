use meteo_backend::InMemoryBackend;
use meteo_catalog::{short_uid, StationCatalog};
use std::collections::BTreeMap;
use std::sync::Arc;

fn legacy_devices() -> BTreeMap<String, String> {
    let mut table = BTreeMap::new();
    table.insert("110020FF0001".to_string(), "RODOS".to_string());
    table
}

#[tokio::test]
async fn discovers_stations_and_channels() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.add_name("monitoring_data.RODOS_110020FF0001.Temperature.min");
    backend.add_name("monitoring_data.RODOS_110020FF0001.Temperature.avg");
    backend.add_name("monitoring_data.RODOS_110020FF0001.Humidity.avg");
    backend.add_name("monitoring_data.RODOS_110020FF0001.Pressure.avg");

    let catalog = StationCatalog::new(backend, "monitoring_data", BTreeMap::new());
    let stations = catalog.discover().await;
    assert_eq!(stations.len(), 1);

    let station = stations.get("110020FF0001").expect("station");
    assert_eq!(station.name, "RODOS");
    assert_eq!(station.station_key(), "RODOS_110020FF0001");
    assert_eq!(station.description, "RODOS Weather Station");
    assert_eq!(station.serie.get("Temperature"), Some(&1));
    assert_eq!(station.serie.get("Humidity"), Some(&2));
    assert_eq!(station.serie.get("Pressure"), Some(&3));
}

#[tokio::test]
async fn splits_combined_key_on_last_underscore() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.add_name("monitoring_data.WX_STATION_AB12.Temperature.avg");

    let catalog = StationCatalog::new(backend, "monitoring_data", BTreeMap::new());
    let stations = catalog.discover().await;
    let station = stations.get("AB12").expect("station");
    assert_eq!(station.name, "WX_STATION");
}

#[tokio::test]
async fn resolves_bare_uid_through_legacy_table() {
    let backend = Arc::new(InMemoryBackend::new());
    // 无名称前缀的旧版指标路径
    backend.add_name("monitoring_data.110020FF0001.Temperature.avg");
    backend.add_name("monitoring_data.FFEE00000001.Temperature.avg");

    let catalog = StationCatalog::new(backend, "monitoring_data", legacy_devices());
    let stations = catalog.discover().await;

    let known = stations.get("110020FF0001").expect("known station");
    assert_eq!(known.name, "RODOS");
    // 对照表没有的 uid 用 uid 本身作名称
    let unknown = stations.get("FFEE00000001").expect("unknown station");
    assert_eq!(unknown.name, "FFEE00000001");
}

#[tokio::test]
async fn backend_failure_degrades_to_empty() {
    let backend = Arc::new(InMemoryBackend::failing());
    let catalog = StationCatalog::new(backend, "monitoring_data", BTreeMap::new());
    assert!(catalog.discover().await.is_empty());
    assert!(catalog.find_station("110020FF0001").await.is_none());
}

#[test]
fn short_uid_takes_tail_after_first_underscore() {
    assert_eq!(short_uid("RODOS_110020FF0001"), "110020FF0001");
    assert_eq!(short_uid("110020FF0001"), "110020FF0001");
}
