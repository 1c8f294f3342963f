//! 应用运行配置加载。
//!
//! 分层合并，启动时一次性解析：内置默认值 < 配置文件（JSON，路径由
//! `METEO_CONFIG` 指定，缺省 `config.json`）< `METEO_*` 环境变量。
//! 解析结果显式传入各组件，运行期不再读取环境。

use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::path::Path;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
    #[error("config file {0}: {1}")]
    File(String, String),
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: String,
    /// 时序后端查询接口基址（render / metrics-find）。
    pub backend_url: String,
    /// 指标命名空间前缀（路径第一段）。
    pub metric_prefix: String,
    /// 明文写入协议地址 `host:port`。
    pub writer_addr: String,
    pub query_timeout_seconds: u64,
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_username: Option<String>,
    pub mqtt_password: Option<String>,
    pub mqtt_topic_prefix: String,
    /// 订阅主题模式，拼接在前缀之后。
    pub mqtt_topic: String,
    pub ingest_enabled: bool,
    /// 旧版设备 UID → 名称对照表（仅来自配置文件）。
    pub legacy_devices: BTreeMap<String, String>,
}

/// 配置文件结构（所有字段可缺省）。
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    http_addr: Option<String>,
    backend_url: Option<String>,
    metric_prefix: Option<String>,
    writer_addr: Option<String>,
    query_timeout_seconds: Option<u64>,
    #[serde(default)]
    mqtt: FileMqttConfig,
    ingest: Option<bool>,
    #[serde(default)]
    legacy_devices: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct FileMqttConfig {
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    topic_prefix: Option<String>,
    topic: Option<String>,
}

impl AppConfig {
    /// 按 默认值 < 文件 < 环境变量 的优先级加载配置。
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var("METEO_CONFIG").unwrap_or_else(|_| "config.json".to_string());
        let file = Self::read_file(&path)?;
        Self::resolve(file)
    }

    /// 从指定文件加载（文件不存在时退回默认值 + 环境变量）。
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let file = Self::read_file(path)?;
        Self::resolve(file)
    }

    fn read_file(path: &str) -> Result<FileConfig, ConfigError> {
        if !Path::new(path).exists() {
            return Ok(FileConfig::default());
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|err| ConfigError::File(path.to_string(), err.to_string()))?;
        serde_json::from_str(&raw).map_err(|err| ConfigError::File(path.to_string(), err.to_string()))
    }

    fn resolve(file: FileConfig) -> Result<Self, ConfigError> {
        let http_addr = layered("METEO_HTTP_ADDR", file.http_addr, "0.0.0.0:5000");
        let backend_url = layered("METEO_BACKEND_URL", file.backend_url, "http://127.0.0.1:8080");
        let metric_prefix = layered("METEO_METRIC_PREFIX", file.metric_prefix, "monitoring_data");
        let writer_addr = layered("METEO_WRITER_ADDR", file.writer_addr, "127.0.0.1:2003");
        let query_timeout_seconds =
            layered_u64("METEO_QUERY_TIMEOUT_SECONDS", file.query_timeout_seconds, 10)?;
        let mqtt_host = layered("METEO_MQTT_HOST", file.mqtt.host, "127.0.0.1");
        let mqtt_port = layered_u16("METEO_MQTT_PORT", file.mqtt.port, 1883)?;
        let mqtt_username = read_optional("METEO_MQTT_USERNAME").or(file.mqtt.username);
        let mqtt_password = read_optional("METEO_MQTT_PASSWORD").or(file.mqtt.password);
        let mqtt_topic_prefix = layered("METEO_MQTT_TOPIC_PREFIX", file.mqtt.topic_prefix, "");
        let mqtt_topic = layered("METEO_MQTT_TOPIC", file.mqtt.topic, "+/data");
        let ingest_enabled = layered_bool("METEO_INGEST", file.ingest, false);

        Ok(Self {
            http_addr,
            backend_url,
            metric_prefix,
            writer_addr,
            query_timeout_seconds,
            mqtt_host,
            mqtt_port,
            mqtt_username,
            mqtt_password,
            mqtt_topic_prefix,
            mqtt_topic,
            ingest_enabled,
            legacy_devices: file.legacy_devices,
        })
    }
}

fn layered(key: &str, file_value: Option<String>, default: &str) -> String {
    match env::var(key) {
        Ok(value) if !value.is_empty() => value,
        _ => file_value.unwrap_or_else(|| default.to_string()),
    }
}

fn layered_u64(key: &str, file_value: Option<u64>, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => value
            .parse::<u64>()
            .map_err(|_| ConfigError::Invalid(key.to_string(), value)),
        _ => Ok(file_value.unwrap_or(default)),
    }
}

fn layered_u16(key: &str, file_value: Option<u16>, default: u16) -> Result<u16, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => value
            .parse::<u16>()
            .map_err(|_| ConfigError::Invalid(key.to_string(), value)),
        _ => Ok(file_value.unwrap_or(default)),
    }
}

fn layered_bool(key: &str, file_value: Option<bool>, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on"),
        Err(_) => file_value.unwrap_or(default),
    }
}

fn read_optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}
