//! 明文写入协议客户端。
//!
//! 每条写入一行 `"{path} {value} {ts}\n"`，TCP 长连接惰性建立，
//! 发送失败即丢弃连接，下一次写入时重连。核心不做重试。

use crate::error::BackendError;
use crate::traits::PointWriter;
use async_trait::async_trait;
use domain::StatWrite;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// 明文协议写入器。
pub struct PlaintextWriter {
    addr: String,
    stream: Mutex<Option<TcpStream>>,
}

impl PlaintextWriter {
    /// 创建写入器，`addr` 形如 `host:port`。连接推迟到首次写入。
    pub fn new(addr: &str) -> Self {
        Self {
            addr: addr.to_string(),
            stream: Mutex::new(None),
        }
    }
}

/// 单条统计写入对应的协议行。
pub fn plaintext_line(write: &StatWrite) -> String {
    format!("{} {} {}\n", write.metric_path, write.value, write.ts)
}

#[async_trait]
impl PointWriter for PlaintextWriter {
    async fn write_point(&self, write: &StatWrite) -> Result<(), BackendError> {
        let line = plaintext_line(write);
        let mut guard = self.stream.lock().await;
        if guard.is_none() {
            let stream = TcpStream::connect(&self.addr).await?;
            info!(target: "meteo.backend", addr = %self.addr, "writer_connected");
            *guard = Some(stream);
        }
        let stream = match guard.as_mut() {
            Some(stream) => stream,
            None => return Err(BackendError::Config("writer not connected".to_string())),
        };
        if let Err(err) = stream.write_all(line.as_bytes()).await {
            // 连接失效，丢弃以便下一次写入重连
            *guard = None;
            return Err(err.into());
        }
        debug!(target: "meteo.backend", line = %line.trim_end(), "point_written");
        Ok(())
    }
}
