//! 三条统计流的按时间戳合并与缺失补全。

use domain::StatRecord;
use meteo_backend::DataPoint;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// 合并三条独立检索的 min/max/avg 点序列。
///
/// 记录集取三条流时间戳的并集，空值点在合并前丢弃，因此不会出现
/// 三项全空的记录。补全策略：某时间戳缺 1~2 项时，取已有项的均值
/// 填入缺失项，并用该时间戳本身回填对应的 `i_*_ts` 字段。合并完成
/// 后每条记录的 `f_min`/`f_max`/`f_avg` 必然全部就位。
pub fn merge_records(
    min: &[DataPoint],
    max: &[DataPoint],
    avg: &[DataPoint],
) -> BTreeMap<i64, StatRecord> {
    let mut records: BTreeMap<i64, StatRecord> = BTreeMap::new();

    for (value, ts) in min {
        if let Some(value) = value {
            let record = records.entry(*ts).or_default();
            record.f_min = Some(*value);
            record.i_min_ts = Some(*ts);
        }
    }
    for (value, ts) in max {
        if let Some(value) = value {
            let record = records.entry(*ts).or_default();
            record.f_max = Some(*value);
            record.i_max_ts = Some(*ts);
        }
    }
    for (value, ts) in avg {
        if let Some(value) = value {
            let record = records.entry(*ts).or_default();
            record.f_avg = Some(*value);
            record.f_act = Some(*value);
            record.i_act_ts = Some(*ts);
        }
    }

    for (ts, record) in records.iter_mut() {
        fill_missing(*ts, record);
    }
    records
}

/// 用已有统计项的均值补齐缺失项。
fn fill_missing(ts: i64, record: &mut StatRecord) {
    let present: Vec<f64> = [record.f_min, record.f_max, record.f_avg]
        .into_iter()
        .flatten()
        .collect();
    if present.is_empty() {
        return;
    }
    let default = present.iter().sum::<f64>() / present.len() as f64;

    if record.f_min.is_none() {
        record.f_min = Some(default);
        record.i_min_ts = Some(ts);
    }
    if record.f_max.is_none() {
        record.f_max = Some(default);
        record.i_max_ts = Some(ts);
    }
    if record.f_avg.is_none() {
        record.f_avg = Some(default);
        record.f_act = Some(default);
        record.i_act_ts = Some(ts);
    }
}

/// 窗口级汇总（`general` 键）：全窗口的最小 min、最大 max、avg 的
/// 累加和与样本数。窗口内没有任何真实值时不产生汇总。
pub fn general_summary(records: &BTreeMap<i64, StatRecord>) -> Option<StatRecord> {
    if records.is_empty() {
        return None;
    }
    let mut summary = StatRecord::default();
    let mut avg_sum = 0.0;
    let mut avg_count = 0u64;
    for record in records.values() {
        if let Some(value) = record.f_min {
            summary.f_min = Some(summary.f_min.map_or(value, |cur: f64| cur.min(value)));
        }
        if let Some(value) = record.f_max {
            summary.f_max = Some(summary.f_max.map_or(value, |cur: f64| cur.max(value)));
        }
        if let Some(value) = record.f_avg {
            avg_sum += value;
            avg_count += 1;
        }
    }
    if avg_count > 0 {
        summary.f_avg_buff = Some(avg_sum);
        summary.i_counter = Some(avg_count);
    }
    Some(summary)
}

/// 一天的合并结果：逐时间戳记录 + 可选的 `general` 汇总。
///
/// 序列化为一个扁平 JSON 对象，键是十进制时间戳字符串，外加
/// `general`（存在时）。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailySeries {
    pub records: BTreeMap<i64, StatRecord>,
    pub general: Option<StatRecord>,
}

impl Serialize for DailySeries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.records.len() + usize::from(self.general.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        for (ts, record) in &self.records {
            map.serialize_entry(&ts.to_string(), record)?;
        }
        if let Some(general) = &self.general {
            map.serialize_entry("general", general)?;
        }
        map.end()
    }
}

/// 合并一天的三条流并附加 `general` 汇总。
pub fn daily_series(min: &[DataPoint], max: &[DataPoint], avg: &[DataPoint]) -> DailySeries {
    let records = merge_records(min, max, avg);
    let general = general_summary(&records);
    DailySeries { records, general }
}

/// 当日速览记录（`stations/newest` 端点）。
///
/// min 取全窗口最小值及其时间戳，max 取最大值（并列时保留最早出现
/// 的），avg 流最后一个点作为当前值，同时累计 `f_avg_buff`/`i_counter`
/// 供调用方推导当日真实均值。
pub fn newest_record(min: &[DataPoint], max: &[DataPoint], avg: &[DataPoint]) -> StatRecord {
    let mut record = StatRecord::default();

    for (value, ts) in min {
        if let Some(value) = value {
            if record.f_min.map_or(true, |cur| *value < cur) {
                record.f_min = Some(*value);
                record.i_min_ts = Some(*ts);
            }
        }
    }
    for (value, ts) in max {
        if let Some(value) = value {
            if record.f_max.map_or(true, |cur| *value > cur) {
                record.f_max = Some(*value);
                record.i_max_ts = Some(*ts);
            }
        }
    }

    let mut avg_sum = 0.0;
    let mut avg_count = 0u64;
    for (value, ts) in avg {
        if let Some(value) = value {
            record.f_act = Some(*value);
            record.i_act_ts = Some(*ts);
            record.f_avg = Some(*value);
            record.i_avg_ts = Some(*ts);
            avg_sum += *value;
            avg_count += 1;
        }
    }
    if avg_count > 0 {
        record.f_avg_buff = Some(avg_sum);
        record.i_counter = Some(avg_count);
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_takes_timestamp_union() {
        let merged = merge_records(
            &[(Some(10.0), 100)],
            &[(Some(20.0), 200)],
            &[(Some(15.0), 100), (None, 300)],
        );
        // 空值点不参与合并
        assert_eq!(merged.len(), 2);
        assert!(merged.contains_key(&100));
        assert!(merged.contains_key(&200));
    }

    #[test]
    fn merge_fills_all_three_stats() {
        let merged = merge_records(
            &[(Some(10.0), 100)],
            &[(Some(20.0), 200)],
            &[(Some(15.0), 300)],
        );
        for record in merged.values() {
            assert!(record.f_min.is_some());
            assert!(record.f_max.is_some());
            assert!(record.f_avg.is_some());
        }
    }

    #[test]
    fn defaulting_uses_mean_of_present_values() {
        let merged = merge_records(&[], &[], &[(Some(20.0), 100)]);
        let record = merged.get(&100).expect("record");
        assert_eq!(record.f_min, Some(20.0));
        assert_eq!(record.f_max, Some(20.0));
        assert_eq!(record.f_avg, Some(20.0));
        // 补出来的统计项带记录自身的时间戳
        assert_eq!(record.i_min_ts, Some(100));
        assert_eq!(record.i_max_ts, Some(100));
        assert_eq!(record.i_act_ts, Some(100));

        let merged = merge_records(&[(Some(10.0), 100)], &[(Some(30.0), 100)], &[]);
        let record = merged.get(&100).expect("record");
        assert_eq!(record.f_avg, Some(20.0));
        assert_eq!(record.f_act, Some(20.0));
    }

    #[test]
    fn general_summary_spans_the_window() {
        let merged = merge_records(
            &[(Some(10.0), 100), (Some(12.0), 200), (Some(9.0), 300)],
            &[(Some(20.0), 100), (Some(22.0), 200), (Some(21.0), 300)],
            &[(Some(15.0), 100), (Some(17.0), 200), (Some(16.0), 300)],
        );
        let general = general_summary(&merged).expect("summary");
        assert_eq!(general.f_min, Some(9.0));
        assert_eq!(general.f_max, Some(22.0));
        assert_eq!(general.f_avg_buff, Some(48.0));
        assert_eq!(general.i_counter, Some(3));
    }

    #[test]
    fn empty_streams_produce_no_general() {
        let series = daily_series(&[(None, 100)], &[], &[]);
        assert!(series.records.is_empty());
        assert!(series.general.is_none());
        let json = serde_json::to_string(&series).expect("serialize");
        assert_eq!(json, "{}");
    }

    #[test]
    fn daily_series_serializes_timestamp_keys() {
        let series = daily_series(
            &[(Some(10.0), 100)],
            &[(Some(20.0), 100)],
            &[(Some(15.0), 100)],
        );
        let json = serde_json::to_value(&series).expect("serialize");
        assert_eq!(json["100"]["f_min"], 10.0);
        assert_eq!(json["general"]["f_max"], 20.0);
        assert_eq!(json["general"]["i_counter"], 1);
    }

    #[test]
    fn newest_keeps_extremes_and_last_avg() {
        let record = newest_record(
            &[(Some(12.0), 100), (Some(9.5), 200), (Some(9.5), 300)],
            &[(Some(21.0), 100), (Some(24.0), 200), (Some(24.0), 300)],
            &[(Some(15.0), 100), (None, 200), (Some(18.0), 300)],
        );
        assert_eq!(record.f_min, Some(9.5));
        // 并列最小/最大保留最早出现的时间戳
        assert_eq!(record.i_min_ts, Some(200));
        assert_eq!(record.f_max, Some(24.0));
        assert_eq!(record.i_max_ts, Some(200));
        assert_eq!(record.f_act, Some(18.0));
        assert_eq!(record.i_act_ts, Some(300));
        assert_eq!(record.f_avg_buff, Some(33.0));
        assert_eq!(record.i_counter, Some(2));
    }

    #[test]
    fn merge_is_deterministic() {
        let min = [(Some(10.0), 100), (Some(11.0), 200)];
        let max = [(Some(20.0), 100)];
        let avg = [(Some(15.0), 200)];
        assert_eq!(merge_records(&min, &max, &avg), merge_records(&min, &max, &avg));
    }
}
