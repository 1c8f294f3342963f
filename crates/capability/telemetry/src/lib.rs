//! 追踪与请求 ID 生成。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 基础指标快照。
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub raw_messages: u64,
    pub stat_reports: u64,
    pub binary_frames: u64,
    pub decode_failures: u64,
    pub write_success: u64,
    pub write_failure: u64,
    pub backend_queries: u64,
    pub backend_query_failures: u64,
}

/// 基础指标。
pub struct TelemetryMetrics {
    raw_messages: AtomicU64,
    stat_reports: AtomicU64,
    binary_frames: AtomicU64,
    decode_failures: AtomicU64,
    write_success: AtomicU64,
    write_failure: AtomicU64,
    backend_queries: AtomicU64,
    backend_query_failures: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            raw_messages: AtomicU64::new(0),
            stat_reports: AtomicU64::new(0),
            binary_frames: AtomicU64::new(0),
            decode_failures: AtomicU64::new(0),
            write_success: AtomicU64::new(0),
            write_failure: AtomicU64::new(0),
            backend_queries: AtomicU64::new(0),
            backend_query_failures: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            raw_messages: self.raw_messages.load(Ordering::Relaxed),
            stat_reports: self.stat_reports.load(Ordering::Relaxed),
            binary_frames: self.binary_frames.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            write_success: self.write_success.load(Ordering::Relaxed),
            write_failure: self.write_failure.load(Ordering::Relaxed),
            backend_queries: self.backend_queries.load(Ordering::Relaxed),
            backend_query_failures: self.backend_query_failures.load(Ordering::Relaxed),
        }
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录原始消息接收次数。
pub fn record_raw_message() {
    metrics().raw_messages.fetch_add(1, Ordering::Relaxed);
}

/// 记录 JSON 统计报文解码次数。
pub fn record_stat_report() {
    metrics().stat_reports.fetch_add(1, Ordering::Relaxed);
}

/// 记录二进制帧解码次数。
pub fn record_binary_frame() {
    metrics().binary_frames.fetch_add(1, Ordering::Relaxed);
}

/// 记录报文解码失败次数。
pub fn record_decode_failure() {
    metrics().decode_failures.fetch_add(1, Ordering::Relaxed);
}

/// 记录写入成功次数。
pub fn record_write_success() {
    metrics().write_success.fetch_add(1, Ordering::Relaxed);
}

/// 记录写入失败次数。
pub fn record_write_failure() {
    metrics().write_failure.fetch_add(1, Ordering::Relaxed);
}

/// 记录后端查询次数。
pub fn record_backend_query() {
    metrics().backend_queries.fetch_add(1, Ordering::Relaxed);
}

/// 记录后端查询失败次数。
pub fn record_backend_query_failure() {
    metrics().backend_query_failures.fetch_add(1, Ordering::Relaxed);
}
