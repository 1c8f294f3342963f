//! 序列查询服务：把后端查询和纯计算函数接起来。

use crate::datatree::{availability_tree, LOOKBACK_DAYS};
use crate::merge::{daily_series, newest_record, DailySeries};
use crate::resample::{monthly_view, yearly_view, DateSpec, Resolution, Window};
use chrono::{NaiveDate, TimeZone};
use domain::{DateTree, StatKind, StatRecord};
use meteo_backend::{series_target, summarize_daily, DataPoint, SeriesBackend};
use meteo_telemetry::{record_backend_query, record_backend_query_failure};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// 一次重采样请求的结果，按分辨率取形。
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SeriesView {
    Day(DailySeries),
    Month(BTreeMap<String, StatRecord>),
    Year(BTreeMap<String, StatRecord>),
}

/// 序列查询服务。
pub struct SeriesService {
    backend: Arc<dyn SeriesBackend>,
    prefix: String,
}

impl SeriesService {
    pub fn new(backend: Arc<dyn SeriesBackend>, prefix: &str) -> Self {
        Self {
            backend,
            prefix: prefix.to_string(),
        }
    }

    /// 站点频道在指定分辨率下的聚合视图。
    ///
    /// 日期解析失败或后端不可用时退化为对应形状的空对象。
    pub async fn view<Tz: TimeZone + Sync>(
        &self,
        tz: &Tz,
        station_key: &str,
        channel: &str,
        resolution: Resolution,
        date: &str,
    ) -> SeriesView {
        let Some(spec) = DateSpec::parse(resolution, date) else {
            return empty_view(resolution);
        };
        let Some(window) = Window::of(tz, spec) else {
            return empty_view(resolution);
        };
        let from = window.from.to_string();
        let until = window.until.to_string();

        match spec {
            DateSpec::Day(_) => {
                let (min, max, avg) = self
                    .query_stat_streams(station_key, channel, &from, &until)
                    .await;
                SeriesView::Day(daily_series(&min, &max, &avg))
            }
            DateSpec::Month { year, month } => {
                let min_target =
                    series_target(&self.prefix, station_key, channel, StatKind::Min);
                let max_target =
                    series_target(&self.prefix, station_key, channel, StatKind::Max);
                let avg_target =
                    series_target(&self.prefix, station_key, channel, StatKind::Avg);
                let day_min = self
                    .query(&summarize_daily(&min_target, StatKind::Min), &from, Some(&until))
                    .await;
                let day_max = self
                    .query(&summarize_daily(&max_target, StatKind::Max), &from, Some(&until))
                    .await;
                // avg 的日内累计需要原始点，不走日汇总
                let raw_avg = self.query(&avg_target, &from, Some(&until)).await;
                SeriesView::Month(monthly_view(tz, year, month, &day_min, &day_max, &raw_avg))
            }
            DateSpec::Year(_) => {
                let (min, max, avg) = self
                    .query_stat_streams(station_key, channel, &from, &until)
                    .await;
                SeriesView::Year(yearly_view(tz, &min, &max, &avg))
            }
        }
    }

    /// 当日速览：今天零点以来的 min/max/avg 概要记录。
    pub async fn newest<Tz: TimeZone + Sync>(
        &self,
        tz: &Tz,
        station_key: &str,
        channel: &str,
        now_ts: i64,
    ) -> StatRecord {
        let Some(from) = today_start(tz, now_ts) else {
            return StatRecord::default();
        };
        let from = from.to_string();
        let min_target = series_target(&self.prefix, station_key, channel, StatKind::Min);
        let max_target = series_target(&self.prefix, station_key, channel, StatKind::Max);
        let avg_target = series_target(&self.prefix, station_key, channel, StatKind::Avg);
        let min = self.query(&min_target, &from, None).await;
        let max = self.query(&max_target, &from, None).await;
        let avg = self.query(&avg_target, &from, None).await;
        newest_record(&min, &max, &avg)
    }

    /// 站点频道的可用日期树（固定回看窗口）。
    pub async fn availability<Tz: TimeZone + Sync>(
        &self,
        tz: &Tz,
        station_key: &str,
        channel: &str,
        now_ts: i64,
    ) -> DateTree {
        let avg_target = series_target(&self.prefix, station_key, channel, StatKind::Avg);
        let day_avg = self
            .query(
                &summarize_daily(&avg_target, StatKind::Avg),
                &format!("-{}d", LOOKBACK_DAYS),
                None,
            )
            .await;
        availability_tree(tz, now_ts, &day_avg)
    }

    async fn query_stat_streams(
        &self,
        station_key: &str,
        channel: &str,
        from: &str,
        until: &str,
    ) -> (Vec<DataPoint>, Vec<DataPoint>, Vec<DataPoint>) {
        let min_target = series_target(&self.prefix, station_key, channel, StatKind::Min);
        let max_target = series_target(&self.prefix, station_key, channel, StatKind::Max);
        let avg_target = series_target(&self.prefix, station_key, channel, StatKind::Avg);
        let min = self.query(&min_target, from, Some(until)).await;
        let max = self.query(&max_target, from, Some(until)).await;
        let avg = self.query(&avg_target, from, Some(until)).await;
        (min, max, avg)
    }

    /// 单个序列查询，失败降级为空序列。
    async fn query(&self, target: &str, from: &str, until: Option<&str>) -> Vec<DataPoint> {
        record_backend_query();
        match self.backend.query_points(target, from, until).await {
            Ok(points) => points,
            Err(err) => {
                record_backend_query_failure();
                warn!(target: "meteo.series", series = %target, error = %err, "backend_query_failed");
                Vec::new()
            }
        }
    }
}

fn empty_view(resolution: Resolution) -> SeriesView {
    match resolution {
        Resolution::Day => SeriesView::Day(DailySeries::default()),
        Resolution::Month => SeriesView::Month(BTreeMap::new()),
        Resolution::Year => SeriesView::Year(BTreeMap::new()),
    }
}

fn today_start<Tz: TimeZone>(tz: &Tz, now_ts: i64) -> Option<i64> {
    let now = tz.timestamp_opt(now_ts, 0).single()?;
    let date: NaiveDate = now.date_naive();
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(tz.from_local_datetime(&midnight).earliest()?.timestamp())
}
