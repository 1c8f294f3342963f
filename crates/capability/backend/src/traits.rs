//! 后端接口 Trait 定义。

use crate::error::BackendError;
use async_trait::async_trait;
use domain::StatWrite;

/// 一个数据点：值可空（后端对齐采样产生的空洞），时间戳为 Unix 秒。
pub type DataPoint = (Option<f64>, i64);

/// 时序后端查询接口。
///
/// `from`/`until` 采用后端的时间表达式（绝对 Unix 秒或 `-7d` 这类
/// 相对量），`until` 缺省为当前时间。返回序列按时间戳升序。
#[async_trait]
pub trait SeriesBackend: Send + Sync {
    /// 通配符指标名发现。
    async fn find_names(&self, pattern: &str) -> Result<Vec<String>, BackendError>;

    /// 查询一个序列表达式在时间窗口内的数据点。
    async fn query_points(
        &self,
        target: &str,
        from: &str,
        until: Option<&str>,
    ) -> Result<Vec<DataPoint>, BackendError>;
}

/// 统计点写入接口（fire-and-forget，单点语义）。
#[async_trait]
pub trait PointWriter: Send + Sync {
    async fn write_point(&self, write: &StatWrite) -> Result<(), BackendError>;

    /// 逐点写入一批统计值，返回成功条数。
    async fn write_points(&self, writes: &[StatWrite]) -> Result<usize, BackendError> {
        let mut written = 0;
        for write in writes {
            self.write_point(write).await?;
            written += 1;
        }
        Ok(written)
    }
}
