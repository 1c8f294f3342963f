//! 可用日期树：回看窗口内有样本的日历日集合。

use chrono::{Datelike, TimeZone};
use domain::DateTree;
use meteo_backend::DataPoint;

/// 回看窗口长度（天）。刻意的近似：只为前端日期选择器服务，
/// 不做全历史扫描。
pub const LOOKBACK_DAYS: i64 = 7;

/// 判定"今天仍有数据"的新鲜度窗口（秒）。
const TODAY_WINDOW_SECS: i64 = 86_400;

/// 从日汇总的 avg 序列构建可用日期树。
///
/// 每个非空点登记其 (年, 月, 日)。窗口里最后一个数据点距 `now_ts`
/// 不足 24 小时时，额外强制登记"今天"，让当日尚未进入汇总桶的数据
/// 也能被选中。`now_ts` 显式传入，核心不读时钟。
pub fn availability_tree<Tz: TimeZone>(tz: &Tz, now_ts: i64, day_avg: &[DataPoint]) -> DateTree {
    let mut tree = DateTree::default();
    for (value, ts) in day_avg {
        if value.is_some() {
            if let Some(dt) = tz.timestamp_opt(*ts, 0).single() {
                tree.insert(
                    format!("{:04}", dt.year()),
                    format!("{:02}", dt.month()),
                    format!("{:02}", dt.day()),
                );
            }
        }
    }

    // 最后一个点（无论是否为空值）足够新鲜 → 补登今天
    if let Some((_, last_ts)) = day_avg.last() {
        if now_ts - *last_ts < TODAY_WINDOW_SECS {
            if let Some(today) = tz.timestamp_opt(now_ts, 0).single() {
                tree.insert(
                    format!("{:04}", today.year()),
                    format!("{:02}", today.month()),
                    format!("{:02}", today.day()),
                );
            }
        }
    }
    tree
}
