use async_trait::async_trait;
use domain::RawMessage;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// 采集错误。
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("handler error: {0}")]
    Handler(String),
    #[error("source error: {0}")]
    Source(String),
}

/// RawMessage 处理器。
#[async_trait]
pub trait RawMessageHandler: Send + Sync {
    async fn handle(&self, message: RawMessage) -> Result<(), IngestError>;
}

/// 采集源抽象。
#[async_trait]
pub trait Source: Send + Sync {
    async fn run(&self, handler: Arc<dyn RawMessageHandler>) -> Result<(), IngestError>;
}

/// 占位源（用于接线与测试）。
#[derive(Debug, Default)]
pub struct NoopSource;

#[async_trait]
impl Source for NoopSource {
    async fn run(&self, _handler: Arc<dyn RawMessageHandler>) -> Result<(), IngestError> {
        Ok(())
    }
}

/// MQTT 采集源配置。
#[derive(Debug, Clone)]
pub struct MqttSourceConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// 订阅前缀（可为空）。
    pub topic_prefix: String,
    /// 前缀之后的主题模式，默认 `+/data`。
    pub topic: String,
}

/// MQTT 采集源。
#[derive(Debug, Clone)]
pub struct MqttSource {
    config: MqttSourceConfig,
}

impl MqttSource {
    pub fn new(config: MqttSourceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MqttSourceConfig {
        &self.config
    }

    /// 完整订阅主题：`{prefix}/{topic}`，前缀为空时只有模式本身。
    pub fn subscription(&self) -> String {
        let prefix = self.config.topic_prefix.trim_matches('/');
        if prefix.is_empty() {
            self.config.topic.clone()
        } else {
            format!("{}/{}", prefix, self.config.topic)
        }
    }
}

#[async_trait]
impl Source for MqttSource {
    async fn run(&self, handler: Arc<dyn RawMessageHandler>) -> Result<(), IngestError> {
        let client_id = format!("meteo-ingest-{}", now_epoch());
        let mut options =
            rumqttc::MqttOptions::new(client_id, self.config.host.clone(), self.config.port);
        options.set_keep_alive(Duration::from_secs(30));
        if let (Some(username), Some(password)) =
            (self.config.username.as_ref(), self.config.password.as_ref())
        {
            options.set_credentials(username, password);
        }

        let (client, mut eventloop) = rumqttc::AsyncClient::new(options, 10);
        client
            .subscribe(self.subscription(), rumqttc::QoS::AtMostOnce)
            .await
            .map_err(|err| IngestError::Source(err.to_string()))?;

        loop {
            match eventloop.poll().await {
                Ok(rumqttc::Event::Incoming(rumqttc::Packet::Publish(publish))) => {
                    let station_uid = extract_uid(&self.config.topic_prefix, &publish.topic);
                    let message = RawMessage {
                        station_uid,
                        topic: publish.topic.clone(),
                        payload: publish.payload.to_vec(),
                        received_at: now_epoch(),
                    };
                    if let Err(err) = handler.handle(message).await {
                        warn!("raw message handler failed: {}", err);
                    }
                }
                Ok(_) => {}
                Err(err) => return Err(IngestError::Source(err.to_string())),
            }
        }
    }
}

/// 从主题路径提取站点 UID。
///
/// 期望形如 `{prefix}/SENSOR_UID/data`：以 `data` 结尾时取倒数第二
/// 段，否则取第一段；没有任何段时归为 `unknown`。
pub fn extract_uid(prefix: &str, topic: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let topic = topic.trim_matches('/');
    let rest = if prefix.is_empty() {
        topic
    } else {
        topic.strip_prefix(prefix).unwrap_or(topic)
    };
    let parts: Vec<&str> = rest.split('/').filter(|part| !part.is_empty()).collect();
    if parts.len() >= 2 && parts[parts.len() - 1] == "data" {
        parts[parts.len() - 2].to_string()
    } else if let Some(first) = parts.first() {
        first.to_string()
    } else {
        "unknown".to_string()
    }
}

fn now_epoch() -> i64 {
    let now = std::time::SystemTime::now();
    let duration = now
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    duration.as_secs() as i64
}
