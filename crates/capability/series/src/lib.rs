//! 序列计算核心：合并、补全、重采样、可用日期树。
//!
//! 所有计算函数都是纯函数：输入是查询到的数据点序列与显式的时区 /
//! 当前时间，输出是展示层约定的记录形状。网络访问集中在
//! [`SeriesService`]，后端查询失败一律降级为空结果。

pub mod datatree;
pub mod merge;
pub mod resample;
pub mod service;

pub use datatree::{availability_tree, LOOKBACK_DAYS};
pub use merge::{daily_series, general_summary, merge_records, newest_record, DailySeries};
pub use resample::{monthly_view, yearly_view, DateSpec, Resolution, Window};
pub use service::{SeriesService, SeriesView};
