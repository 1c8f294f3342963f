//! 序列表达式构造辅助。

use domain::StatKind;

/// 单条统计流的序列名：`{prefix}.{station_key}.{channel}.{stat}`。
pub fn series_target(prefix: &str, station_key: &str, channel: &str, stat: StatKind) -> String {
    format!("{}.{}.{}.{}", prefix, station_key, channel, stat.as_str())
}

/// 按天汇总的序列表达式：`summarize({target}, '1d', '{op}')`。
///
/// 汇总算子与统计流同名：min 流按 min 汇总、max 流按 max 汇总、
/// avg 流按 avg 汇总。
pub fn summarize_daily(target: &str, op: StatKind) -> String {
    format!("summarize({}, '1d', '{}')", target, op.as_str())
}
