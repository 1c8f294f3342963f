//! 时序后端访问层。
//!
//! 对外只暴露三个操作：指标名发现（`find_names`）、数据点查询
//! （`query_points`）、统计点写入（`write_point`）。查询走后端的
//! render HTTP 接口，写入走明文 TCP 协议，两者互不共享连接。
//! `in_memory` 实现用于测试。

pub mod error;
pub mod graphite;
pub mod in_memory;
pub mod target;
pub mod traits;
pub mod writer;

pub use error::BackendError;
pub use graphite::GraphiteBackend;
pub use in_memory::{CollectingWriter, InMemoryBackend};
pub use target::{series_target, summarize_daily};
pub use traits::{DataPoint, PointWriter, SeriesBackend};
pub use writer::PlaintextWriter;
