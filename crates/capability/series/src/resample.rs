//! 按日历分辨率的重采样。
//!
//! 一个参数化的重采样器覆盖 日/月/年 三种视图，避免三份近似代码
//! 各自漂移。日历换算对时区泛型：服务端传本地时区，测试用 Utc。

use crate::merge::merge_records;
use chrono::{Datelike, NaiveDate, TimeZone};
use domain::StatRecord;
use meteo_backend::DataPoint;
use std::collections::BTreeMap;

/// 请求的聚合分辨率。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Day,
    Month,
    Year,
}

impl std::str::FromStr for Resolution {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "daily" => Ok(Resolution::Day),
            "monthly" => Ok(Resolution::Month),
            "yearly" => Ok(Resolution::Year),
            _ => Err(()),
        }
    }
}

/// 解析后的日期参数。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSpec {
    /// `YYYY-MM-DD`
    Day(NaiveDate),
    /// `YYYY-MM`
    Month { year: i32, month: u32 },
    /// `YYYY`
    Year(i32),
}

impl DateSpec {
    /// 按分辨率解析日期字符串，格式不符返回 None。
    pub fn parse(resolution: Resolution, date: &str) -> Option<Self> {
        match resolution {
            Resolution::Day => NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .ok()
                .map(DateSpec::Day),
            Resolution::Month => {
                let (year, month) = date.split_once('-')?;
                let year = year.parse::<i32>().ok()?;
                let month = month.parse::<u32>().ok()?;
                // 校验月份合法
                NaiveDate::from_ymd_opt(year, month, 1)?;
                Some(DateSpec::Month { year, month })
            }
            Resolution::Year => {
                let year = date.parse::<i32>().ok()?;
                NaiveDate::from_ymd_opt(year, 1, 1)?;
                Some(DateSpec::Year(year))
            }
        }
    }
}

/// 查询时间窗口 `[from, until)`，Unix 秒。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub from: i64,
    pub until: i64,
}

impl Window {
    /// 计算日期参数在给定时区下的查询窗口。
    pub fn of<Tz: TimeZone>(tz: &Tz, spec: DateSpec) -> Option<Self> {
        let (start, end) = match spec {
            DateSpec::Day(date) => (date, date.succ_opt()?),
            DateSpec::Month { year, month } => {
                let start = NaiveDate::from_ymd_opt(year, month, 1)?;
                let end = if month == 12 {
                    NaiveDate::from_ymd_opt(year + 1, 1, 1)?
                } else {
                    NaiveDate::from_ymd_opt(year, month + 1, 1)?
                };
                (start, end)
            }
            DateSpec::Year(year) => (
                NaiveDate::from_ymd_opt(year, 1, 1)?,
                NaiveDate::from_ymd_opt(year + 1, 1, 1)?,
            ),
        };
        Some(Window {
            from: local_midnight(tz, start)?,
            until: local_midnight(tz, end)?,
        })
    }
}

fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<i64> {
    let naive = date.and_hms_opt(0, 0, 0)?;
    Some(tz.from_local_datetime(&naive).earliest()?.timestamp())
}

/// 月视图：日汇总的 min/max 序列 + 原始 avg 序列 → 日号("01".."31")
/// 分桶的记录集。
///
/// 汇总点时间戳漂出请求月份的日子直接丢弃。原始 avg 按日累计
/// `f_avg_buff`/`i_counter`，当天时间上最后一个点作为 `f_act`。有
/// min/max 但整日没有 avg 数据时退化为 `(f_min+f_max)/2` 单样本。
pub fn monthly_view<Tz: TimeZone>(
    tz: &Tz,
    year: i32,
    month: u32,
    day_min: &[DataPoint],
    day_max: &[DataPoint],
    raw_avg: &[DataPoint],
) -> BTreeMap<String, StatRecord> {
    let mut days: BTreeMap<String, StatRecord> = BTreeMap::new();

    for (value, ts) in day_min {
        if let Some(value) = value {
            if let Some(day) = day_key(tz, *ts, year, month) {
                let record = days.entry(day).or_default();
                record.f_min = Some(*value);
                record.i_min_ts = Some(*ts);
            }
        }
    }
    for (value, ts) in day_max {
        if let Some(value) = value {
            if let Some(day) = day_key(tz, *ts, year, month) {
                let record = days.entry(day).or_default();
                record.f_max = Some(*value);
                record.i_max_ts = Some(*ts);
            }
        }
    }

    let mut day_values: BTreeMap<String, Vec<(f64, i64)>> = BTreeMap::new();
    for (value, ts) in raw_avg {
        if let Some(value) = value {
            if let Some(day) = day_key(tz, *ts, year, month) {
                day_values.entry(day).or_default().push((*value, *ts));
            }
        }
    }
    for (day, values) in day_values {
        let record = days.entry(day).or_default();
        record.f_avg_buff = Some(values.iter().map(|(value, _)| value).sum());
        record.i_counter = Some(values.len() as u64);
        if let Some((last_value, last_ts)) = values.last() {
            record.f_act = Some(*last_value);
            record.i_act_ts = Some(*last_ts);
        }
    }

    // 整日无 avg 数据时用 min/max 的中值兜底
    for record in days.values_mut() {
        if record.f_avg_buff.is_none() {
            if let (Some(f_min), Some(f_max)) = (record.f_min, record.f_max) {
                let fallback = (f_min + f_max) / 2.0;
                record.f_avg_buff = Some(fallback);
                record.i_counter = Some(1);
                record.f_act = Some(fallback);
                record.i_act_ts = Some(record.i_max_ts.unwrap_or(0));
            }
        }
    }
    days
}

fn day_key<Tz: TimeZone>(tz: &Tz, ts: i64, year: i32, month: u32) -> Option<String> {
    let dt = tz.timestamp_opt(ts, 0).single()?;
    if dt.year() == year && dt.month() == month {
        Some(format!("{:02}", dt.day()))
    } else {
        None
    }
}

struct MonthAcc {
    record: StatRecord,
    sum_avg: f64,
    count: u64,
}

/// 年视图：整年的逐时间戳合并结果按月号("1".."12")聚合。
///
/// min 取更小值替换（并更新 `i_min_ts`），max 对称；`f_avg` 为该月
/// 逐时间戳 avg 的算术平均，`f_act` 与之一致。
pub fn yearly_view<Tz: TimeZone>(
    tz: &Tz,
    min: &[DataPoint],
    max: &[DataPoint],
    avg: &[DataPoint],
) -> BTreeMap<String, StatRecord> {
    let records = merge_records(min, max, avg);
    let mut months: BTreeMap<String, MonthAcc> = BTreeMap::new();

    for (ts, record) in &records {
        let Some(dt) = tz.timestamp_opt(*ts, 0).single() else {
            continue;
        };
        let key = dt.month().to_string();
        match months.get_mut(&key) {
            None => {
                months.insert(
                    key,
                    MonthAcc {
                        record: *record,
                        sum_avg: record.f_avg.unwrap_or(0.0),
                        count: 1,
                    },
                );
            }
            Some(acc) => {
                if let Some(value) = record.f_min {
                    if acc.record.f_min.map_or(true, |cur| value < cur) {
                        acc.record.f_min = Some(value);
                        acc.record.i_min_ts = record.i_min_ts;
                    }
                }
                if let Some(value) = record.f_max {
                    if acc.record.f_max.map_or(true, |cur| value > cur) {
                        acc.record.f_max = Some(value);
                        acc.record.i_max_ts = record.i_max_ts;
                    }
                }
                if let Some(value) = record.f_avg {
                    acc.sum_avg += value;
                    acc.count += 1;
                }
            }
        }
    }

    months
        .into_iter()
        .map(|(key, acc)| {
            let mut record = acc.record;
            if acc.count > 0 {
                let mean = acc.sum_avg / acc.count as f64;
                record.f_avg = Some(mean);
                record.f_act = Some(mean);
            }
            (key, record)
        })
        .collect()
}
