//! Graphite 风格后端的 HTTP 查询客户端。
//!
//! - `find_names`：`GET {base}/metrics/find?query=...&format=completer`
//! - `query_points`：`GET {base}/render?target=...&from=...&until=...&format=json`

use crate::error::BackendError;
use crate::traits::{DataPoint, SeriesBackend};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// 时序后端 HTTP 客户端。
#[derive(Debug, Clone)]
pub struct GraphiteBackend {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct CompleterReply {
    #[serde(default)]
    metrics: Vec<CompleterEntry>,
}

#[derive(Debug, Deserialize)]
struct CompleterEntry {
    path: String,
}

#[derive(Debug, Deserialize)]
struct RenderSeries {
    #[serde(default)]
    datapoints: Vec<DataPoint>,
}

impl GraphiteBackend {
    /// 创建客户端，`base_url` 形如 `http://host:port`。
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|err| BackendError::Config(err.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// 连通性探测：拉取指标索引，用于健康检查。
    pub async fn probe(&self) -> Result<(), BackendError> {
        let url = format!("{}/metrics/index.json", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| BackendError::Http(err.to_string()))?;
        response
            .error_for_status()
            .map_err(|err| BackendError::Http(err.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl SeriesBackend for GraphiteBackend {
    async fn find_names(&self, pattern: &str) -> Result<Vec<String>, BackendError> {
        let url = format!("{}/metrics/find", self.base_url);
        debug!(target: "meteo.backend", query = %pattern, "metrics_find");
        let response = self
            .client
            .get(&url)
            .query(&[("query", pattern), ("format", "completer")])
            .send()
            .await
            .map_err(|err| BackendError::Http(err.to_string()))?
            .error_for_status()
            .map_err(|err| BackendError::Http(err.to_string()))?;
        let reply: CompleterReply = response
            .json()
            .await
            .map_err(|err| BackendError::Decode(err.to_string()))?;
        Ok(reply
            .metrics
            .into_iter()
            .map(|entry| entry.path.trim_end_matches('.').to_string())
            .collect())
    }

    async fn query_points(
        &self,
        target: &str,
        from: &str,
        until: Option<&str>,
    ) -> Result<Vec<DataPoint>, BackendError> {
        let url = format!("{}/render", self.base_url);
        let until = until.unwrap_or("now");
        debug!(target: "meteo.backend", series = %target, from = %from, until = %until, "render_query");
        let response = self
            .client
            .get(&url)
            .query(&[
                ("target", target),
                ("from", from),
                ("until", until),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|err| BackendError::Http(err.to_string()))?
            .error_for_status()
            .map_err(|err| BackendError::Http(err.to_string()))?;
        let reply: Vec<RenderSeries> = response
            .json()
            .await
            .map_err(|err| BackendError::Decode(err.to_string()))?;
        Ok(reply
            .into_iter()
            .next()
            .map(|series| series.datapoints)
            .unwrap_or_default())
    }
}
