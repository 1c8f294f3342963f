//! 采集链路装配模块
//!
//! 把数据采集的各个组件（MQTT 源、报文解码、归一化写入）组装成
//! 完整链路：原始消息先按 JSON 统计报文解析，不成再按旧版二进制
//! 帧解码，得到的归一化统计写入逐条转发到时序后端的写入口。
//! 坏消息只丢弃本条并记数，链路继续运行。

use meteo_backend::{PlaintextWriter, PointWriter};
use meteo_config::AppConfig;
use meteo_ingest::{IngestError, MqttSource, MqttSourceConfig, NoopSource, RawMessageHandler, Source};
use meteo_normalize::parse_stat_report;
use meteo_protocol::{decode_frame, record_writes};
use meteo_telemetry::{
    record_binary_frame, record_decode_failure, record_raw_message, record_stat_report,
    record_write_failure, record_write_success,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// 桥接处理器：原始消息 → 归一化写入 → 后端。
struct BridgeHandler {
    writer: Arc<dyn PointWriter>,
    prefix: String,
    legacy_devices: BTreeMap<String, String>,
}

impl BridgeHandler {
    /// 解码一条消息，得到归一化写入列表。
    ///
    /// JSON 统计报文优先；解析不了的再尝试旧版二进制帧。两者都
    /// 失败只返回 None，由调用方记数并丢弃。
    fn decode(&self, message: &domain::RawMessage) -> Option<Vec<domain::StatWrite>> {
        match parse_stat_report(
            &self.prefix,
            &message.station_uid,
            &message.payload,
            message.received_at,
        ) {
            Ok(writes) => {
                record_stat_report();
                return Some(writes);
            }
            Err(_) => {}
        }
        match decode_frame(&message.payload) {
            Ok(records) => {
                record_binary_frame();
                Some(
                    records
                        .iter()
                        .flat_map(|record| record_writes(&self.prefix, &self.legacy_devices, record))
                        .collect(),
                )
            }
            Err(err) => {
                warn!(
                    target: "meteo.ingest",
                    topic = %message.topic,
                    payload_size = message.payload.len(),
                    error = %err,
                    "message_decode_failed"
                );
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl RawMessageHandler for BridgeHandler {
    async fn handle(&self, message: domain::RawMessage) -> Result<(), IngestError> {
        record_raw_message();
        info!(
            target: "meteo.ingest",
            station_uid = %message.station_uid,
            topic = %message.topic,
            payload_size = message.payload.len(),
            received_at = message.received_at,
            "raw_message_received"
        );

        let Some(writes) = self.decode(&message) else {
            record_decode_failure();
            return Ok(());
        };

        let mut forwarded = 0usize;
        for write in &writes {
            match self.writer.write_point(write).await {
                Ok(()) => {
                    record_write_success();
                    forwarded += 1;
                }
                Err(err) => {
                    record_write_failure();
                    warn!(
                        target: "meteo.ingest",
                        metric_path = %write.metric_path,
                        error = %err,
                        "stat_write_failed"
                    );
                }
            }
        }
        info!(
            target: "meteo.ingest",
            station_uid = %message.station_uid,
            decoded = writes.len(),
            forwarded = forwarded,
            "stat_writes_forwarded"
        );
        Ok(())
    }
}

/// 启动采集任务
///
/// 根据配置选择 MQTT 采集源或空操作源，并绑定桥接处理器。
pub fn spawn_ingest(config: &AppConfig) -> tokio::task::JoinHandle<()> {
    let writer: Arc<dyn PointWriter> = Arc::new(PlaintextWriter::new(&config.writer_addr));
    let handler = Arc::new(BridgeHandler {
        writer,
        prefix: config.metric_prefix.clone(),
        legacy_devices: config.legacy_devices.clone(),
    });

    let source: Arc<dyn Source> = if config.ingest_enabled {
        let mqtt_config = MqttSourceConfig {
            host: config.mqtt_host.clone(),
            port: config.mqtt_port,
            username: config.mqtt_username.clone(),
            password: config.mqtt_password.clone(),
            topic_prefix: config.mqtt_topic_prefix.clone(),
            topic: config.mqtt_topic.clone(),
        };
        info!(
            "ingest source: mqtt {}:{} prefix={}",
            mqtt_config.host, mqtt_config.port, mqtt_config.topic_prefix
        );
        Arc::new(MqttSource::new(mqtt_config))
    } else {
        info!("ingest source: noop (METEO_INGEST=off)");
        Arc::new(NoopSource)
    };

    tokio::spawn(async move {
        if let Err(err) = source.run(handler).await {
            warn!("ingest stopped: {}", err);
        }
    })
}
