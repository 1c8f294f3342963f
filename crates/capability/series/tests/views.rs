use chrono::Utc;
use meteo_backend::InMemoryBackend;
use meteo_series::{Resolution, SeriesService, SeriesView};
use std::sync::Arc;

const PREFIX: &str = "monitoring_data";
const STATION: &str = "RODOS_110020FF0001";

// 2025-11-02 00:00 UTC
const NOV_2: i64 = 1762041600;

fn target(stat: &str) -> String {
    format!("{}.{}.Temperature.{}", PREFIX, STATION, stat)
}

fn summarized(stat: &str) -> String {
    format!("summarize({}, '1d', '{}')", target(stat), stat)
}

#[tokio::test]
async fn daily_view_merges_and_defaults() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.add_points(&target("min"), vec![(Some(10.0), NOV_2 + 3600)]);
    backend.add_points(&target("max"), vec![(Some(20.0), NOV_2 + 3600)]);
    // 只有 avg 的时间戳：min/max 由补全策略产生
    backend.add_points(&target("avg"), vec![(Some(15.0), NOV_2 + 3600), (Some(21.0), NOV_2 + 7200)]);

    let service = SeriesService::new(backend, PREFIX);
    let view = service
        .view(&Utc, STATION, "Temperature", Resolution::Day, "2025-11-02")
        .await;
    let json = serde_json::to_value(&view).expect("serialize");

    let full = &json[(NOV_2 + 3600).to_string()];
    assert_eq!(full["f_min"], 10.0);
    assert_eq!(full["f_max"], 20.0);
    assert_eq!(full["f_avg"], 15.0);

    let defaulted = &json[(NOV_2 + 7200).to_string()];
    assert_eq!(defaulted["f_min"], 21.0);
    assert_eq!(defaulted["f_max"], 21.0);
    assert_eq!(defaulted["i_min_ts"], NOV_2 + 7200);

    assert_eq!(json["general"]["f_min"], 10.0);
    assert_eq!(json["general"]["f_max"], 21.0);
    assert_eq!(json["general"]["f_avg_buff"], 36.0);
    assert_eq!(json["general"]["i_counter"], 2);
}

#[tokio::test]
async fn monthly_view_uses_summaries_and_raw_avg() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.add_points(&summarized("min"), vec![(Some(10.0), NOV_2)]);
    backend.add_points(&summarized("max"), vec![(Some(20.0), NOV_2)]);
    // 整月没有原始 avg 点 → 日桶退化为中值单样本

    let service = SeriesService::new(backend, PREFIX);
    let view = service
        .view(&Utc, STATION, "Temperature", Resolution::Month, "2025-11")
        .await;
    let json = serde_json::to_value(&view).expect("serialize");
    assert_eq!(json["02"]["f_min"], 10.0);
    assert_eq!(json["02"]["f_max"], 20.0);
    assert_eq!(json["02"]["f_avg_buff"], 15.0);
    assert_eq!(json["02"]["i_counter"], 1);
    assert_eq!(json["02"]["f_act"], 15.0);
}

#[tokio::test]
async fn yearly_view_groups_months() {
    let backend = Arc::new(InMemoryBackend::new());
    // 2025-01-15 12:00 与 2025-02-10 12:00 UTC
    let january = 1736942400;
    let february = 1739188800;
    backend.add_points(&target("min"), vec![(Some(-5.0), january), (Some(1.0), february)]);
    backend.add_points(&target("max"), vec![(Some(4.0), january), (Some(9.0), february)]);
    backend.add_points(&target("avg"), vec![(Some(0.0), january), (Some(5.0), february)]);

    let service = SeriesService::new(backend, PREFIX);
    let view = service
        .view(&Utc, STATION, "Temperature", Resolution::Year, "2025")
        .await;
    let json = serde_json::to_value(&view).expect("serialize");
    assert_eq!(json["1"]["f_min"], -5.0);
    assert_eq!(json["1"]["f_max"], 4.0);
    assert_eq!(json["2"]["f_avg"], 5.0);
    assert_eq!(json["2"]["f_act"], 5.0);
}

#[tokio::test]
async fn malformed_date_yields_empty_object() {
    let backend = Arc::new(InMemoryBackend::new());
    let service = SeriesService::new(backend, PREFIX);
    for (resolution, date) in [
        (Resolution::Day, "not-a-date"),
        (Resolution::Month, "2025-13"),
        (Resolution::Year, "late"),
    ] {
        let view = service
            .view(&Utc, STATION, "Temperature", resolution, date)
            .await;
        let json = serde_json::to_value(&view).expect("serialize");
        assert_eq!(json, serde_json::json!({}));
    }
}

#[tokio::test]
async fn backend_failure_degrades_to_empty_view() {
    let backend = Arc::new(InMemoryBackend::failing());
    let service = SeriesService::new(backend, PREFIX);
    let view = service
        .view(&Utc, STATION, "Temperature", Resolution::Day, "2025-11-02")
        .await;
    match view {
        SeriesView::Day(series) => {
            assert!(series.records.is_empty());
            assert!(series.general.is_none());
        }
        _ => panic!("expected day view"),
    }
}

#[tokio::test]
async fn newest_summarizes_today() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.add_points(&target("min"), vec![(Some(9.0), NOV_2 + 3600)]);
    backend.add_points(&target("max"), vec![(Some(22.0), NOV_2 + 3600)]);
    backend.add_points(
        &target("avg"),
        vec![(Some(15.0), NOV_2 + 3600), (Some(16.0), NOV_2 + 7200)],
    );

    let service = SeriesService::new(backend, PREFIX);
    let record = service
        .newest(&Utc, STATION, "Temperature", NOV_2 + 43200)
        .await;
    assert_eq!(record.f_min, Some(9.0));
    assert_eq!(record.f_max, Some(22.0));
    assert_eq!(record.f_act, Some(16.0));
    assert_eq!(record.i_act_ts, Some(NOV_2 + 7200));
    assert_eq!(record.f_avg_buff, Some(31.0));
    assert_eq!(record.i_counter, Some(2));
}

#[tokio::test]
async fn availability_injects_fresh_today() {
    let backend = Arc::new(InMemoryBackend::new());
    // 今天的汇总桶还没有数值（当日数据未进桶），但桶本身已存在
    backend.add_points(
        &summarized("avg"),
        vec![(Some(15.0), NOV_2 - 86_400), (None, NOV_2)],
    );

    let service = SeriesService::new(backend, PREFIX);
    // 最后一个汇总点 10 小时前 → 今天（11-02）仍要出现在树里
    let tree = service
        .availability(&Utc, STATION, "Temperature", NOV_2 + 10 * 3600)
        .await;
    let json = serde_json::to_value(&tree).expect("serialize");
    assert_eq!(json["years"][0], "2025");
    assert_eq!(json["2025"]["months"][0], "11");
    assert_eq!(json["2025"]["11"][0], "01");
    assert_eq!(json["2025"]["11"][1], "02");
}

#[tokio::test]
async fn views_are_idempotent() {
    let backend = Arc::new(InMemoryBackend::new());
    backend.add_points(&target("min"), vec![(Some(10.0), NOV_2 + 3600)]);
    backend.add_points(&target("max"), vec![(Some(20.0), NOV_2 + 3600)]);
    backend.add_points(&target("avg"), vec![(Some(15.0), NOV_2 + 3600)]);

    let service = SeriesService::new(backend, PREFIX);
    let first = service
        .view(&Utc, STATION, "Temperature", Resolution::Day, "2025-11-02")
        .await;
    let second = service
        .view(&Utc, STATION, "Temperature", Resolution::Day, "2025-11-02")
        .await;
    assert_eq!(
        serde_json::to_string(&first).expect("serialize"),
        serde_json::to_string(&second).expect("serialize")
    );
}
