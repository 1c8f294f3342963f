//! 后端接口内存实现
//!
//! 仅用于本地测试和占位。

use crate::error::BackendError;
use crate::traits::{DataPoint, PointWriter, SeriesBackend};
use async_trait::async_trait;
use domain::StatWrite;
use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

/// 时序后端内存实现。
///
/// `find_names` 对存入的叶子指标名做分段通配匹配，返回与模式同深度
/// 的去重前缀（模拟 completer 行为）；`query_points` 按表达式全文
/// 精确命中，`from`/`until` 仅在能解析为绝对 Unix 秒时参与过滤。
pub struct InMemoryBackend {
    names: RwLock<Vec<String>>,
    points: RwLock<HashMap<String, Vec<DataPoint>>>,
    fail_queries: bool,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            names: RwLock::new(Vec::new()),
            points: RwLock::new(HashMap::new()),
            fail_queries: false,
        }
    }

    /// 所有查询都报错的后端（用于降级路径测试）。
    pub fn failing() -> Self {
        Self {
            names: RwLock::new(Vec::new()),
            points: RwLock::new(HashMap::new()),
            fail_queries: true,
        }
    }

    /// 登记一个叶子指标名。
    pub fn add_name(&self, name: &str) {
        if let Ok(mut names) = self.names.write() {
            names.push(name.to_string());
        }
    }

    /// 登记一个序列表达式的数据点（按查询时的表达式全文命中）。
    pub fn add_points(&self, target: &str, points: Vec<DataPoint>) {
        if let Ok(mut map) = self.points.write() {
            map.entry(target.to_string()).or_default().extend(points);
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn segments_match(pattern: &[&str], name: &[&str]) -> bool {
    if name.len() < pattern.len() {
        return false;
    }
    pattern
        .iter()
        .zip(name.iter())
        .all(|(p, n)| *p == "*" || p == n)
}

#[async_trait]
impl SeriesBackend for InMemoryBackend {
    async fn find_names(&self, pattern: &str) -> Result<Vec<String>, BackendError> {
        if self.fail_queries {
            return Err(BackendError::Http("backend unavailable".to_string()));
        }
        let pattern_parts: Vec<&str> = pattern.split('.').collect();
        let names = self
            .names
            .read()
            .map_err(|_| BackendError::Decode("lock failed".to_string()))?;
        let mut found = BTreeSet::new();
        for name in names.iter() {
            let parts: Vec<&str> = name.split('.').collect();
            if segments_match(&pattern_parts, &parts) {
                found.insert(parts[..pattern_parts.len()].join("."));
            }
        }
        Ok(found.into_iter().collect())
    }

    async fn query_points(
        &self,
        target: &str,
        from: &str,
        until: Option<&str>,
    ) -> Result<Vec<DataPoint>, BackendError> {
        if self.fail_queries {
            return Err(BackendError::Http("backend unavailable".to_string()));
        }
        let map = self
            .points
            .read()
            .map_err(|_| BackendError::Decode("lock failed".to_string()))?;
        let mut points = map.get(target).cloned().unwrap_or_default();
        if let Ok(from_ts) = from.parse::<i64>() {
            points.retain(|(_, ts)| *ts >= from_ts);
        }
        if let Some(Ok(until_ts)) = until.map(|value| value.parse::<i64>()) {
            points.retain(|(_, ts)| *ts < until_ts);
        }
        points.sort_by_key(|(_, ts)| *ts);
        Ok(points)
    }
}

/// 收集写入的内存写入器（用于测试断言）。
#[derive(Default)]
pub struct CollectingWriter {
    writes: RwLock<Vec<StatWrite>>,
}

impl CollectingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前累计的写入（按写入顺序）。
    pub fn writes(&self) -> Vec<StatWrite> {
        self.writes.read().map(|w| w.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PointWriter for CollectingWriter {
    async fn write_point(&self, write: &StatWrite) -> Result<(), BackendError> {
        self.writes
            .write()
            .map_err(|_| BackendError::Decode("lock failed".to_string()))?
            .push(write.clone());
        Ok(())
    }
}
