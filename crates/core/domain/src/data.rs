use serde::Serialize;
use std::collections::BTreeMap;

/// 三条独立采样的统计流类别。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKind {
    Min,
    Max,
    Avg,
}

impl StatKind {
    /// 指标路径里的统计后缀。
    pub fn as_str(&self) -> &'static str {
        match self {
            StatKind::Min => "min",
            StatKind::Max => "max",
            StatKind::Avg => "avg",
        }
    }
}

/// 一条归一化统计写入（指标路径 + 值 + Unix 秒时间戳）。
#[derive(Debug, Clone, PartialEq)]
pub struct StatWrite {
    pub metric_path: String,
    pub value: f64,
    pub ts: i64,
}

/// 采集源输入的原始消息。
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub station_uid: String,
    pub topic: String,
    pub payload: Vec<u8>,
    pub received_at: i64,
}

/// 单个键（时间戳 / 日 / 月）下的统计记录。
///
/// 所有字段可缺省，序列化时只输出已填充的键，与展示层约定的
/// `f_min`/`i_min_ts`/… 字段表保持一致。
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub f_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub i_min_ts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub f_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub i_max_ts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub f_avg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub i_avg_ts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub f_act: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub i_act_ts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub f_avg_buff: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub i_counter: Option<u64>,
}

impl StatRecord {
    /// min/max/avg 是否全部为空。
    pub fn is_empty(&self) -> bool {
        self.f_min.is_none() && self.f_max.is_none() && self.f_avg.is_none()
    }
}

/// 单个年份的可用月/日集合。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct YearEntry {
    pub months: Vec<String>,
    #[serde(flatten)]
    pub days: BTreeMap<String, Vec<String>>,
}

/// 站点频道的可用日期树（仅覆盖回看窗口，非完整历史索引）。
///
/// 输出形如 `{"years":["2025"],"2025":{"months":["11"],"11":["22","23"]}}`，
/// 年/月/日键统一零填充，各层均按升序排列。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DateTree {
    pub years: Vec<String>,
    #[serde(flatten)]
    pub by_year: BTreeMap<String, YearEntry>,
}

impl DateTree {
    /// 登记一个可用日期（键需已零填充）。
    pub fn insert(&mut self, year: String, month: String, day: String) {
        let entry = self.by_year.entry(year.clone()).or_default();
        if !self.years.contains(&year) {
            self.years.push(year);
            self.years.sort();
        }
        if !entry.months.contains(&month) {
            entry.months.push(month.clone());
            entry.months.sort();
        }
        let days = entry.days.entry(month).or_default();
        if !days.contains(&day) {
            days.push(day);
            days.sort();
        }
    }

    /// 树是否为空（窗口内无任何样本）。
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}
