//! 稳定的 DTO 与响应体契约。
//!
//! 数据端点直接返回裸 JSON 对象（键为时间戳 / 日 / 月 / 站点 UID），
//! 此处只固定错误体与少量系统端点的结构。

use serde::Serialize;
use std::collections::BTreeMap;

/// 错误响应体（404/500/解析失败）。
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    pub status: u16,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, message: impl Into<String>, status: u16) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status,
        }
    }
}

/// 版本端点返回结构。
#[derive(Debug, Serialize)]
pub struct VersionDto {
    pub version: String,
    pub date: String,
}

/// 健康检查返回结构。
#[derive(Debug, Serialize)]
pub struct HealthDto {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub services: BTreeMap<String, String>,
}

/// 站点描述返回结构。
#[derive(Debug, Serialize)]
pub struct StationDto {
    pub uid: String,
    pub name: String,
    pub serie: BTreeMap<String, u32>,
    pub description: String,
    pub timezone: String,
    pub longitude: f64,
    pub latitude: f64,
}

/// Telemetry 计数器快照返回结构。
#[derive(Debug, Serialize)]
pub struct MetricsSnapshotDto {
    pub raw_messages: u64,
    pub stat_reports: u64,
    pub binary_frames: u64,
    pub decode_failures: u64,
    pub write_success: u64,
    pub write_failure: u64,
    pub backend_queries: u64,
    pub backend_query_failures: u64,
}
