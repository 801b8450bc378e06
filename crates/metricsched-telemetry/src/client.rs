//! HTTP-backed metric source.

use std::future::Future;

use metricsched_core::HttpClient;
use tracing::debug;

use crate::error::FetchError;
use crate::query::{MetricQuery, extract_metric};

/// Something that can produce one metric value for a bare host name.
///
/// The ranking engine fans calls out across tasks, so implementations are
/// shared behind an `Arc` and must be `Send + Sync`.
pub trait MetricSource: Send + Sync + 'static {
    fn fetch(&self, host: &str) -> impl Future<Output = Result<f64, FetchError>> + Send;
}

/// Queries the telemetry backend's `/api/data` endpoint.
#[derive(Clone)]
pub struct TelemetryClient {
    http: HttpClient,
    endpoint: String,
    metrics: Vec<String>,
}

impl TelemetryClient {
    pub fn new(http: HttpClient, base_url: &str, metrics: Vec<String>) -> Self {
        Self {
            http,
            endpoint: format!("{}/api/data", base_url.trim_end_matches('/')),
            metrics,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Query one host once. No retries.
    pub async fn get_metric(&self, host: &str) -> Result<f64, FetchError> {
        let query = MetricQuery::for_host(self.metrics.iter().cloned(), host);

        let resp = self
            .http
            .post_json(&self.endpoint, &query)
            .await
            .map_err(|e| FetchError::Backend(e.to_string()))?;

        if resp.status.as_u16() != 200 {
            return Err(FetchError::Backend(format!(
                "metric data response: {}",
                resp.status
            )));
        }

        let value = extract_metric(&resp.body)?;
        debug!(%host, value, "metric fetched");
        Ok(value)
    }
}

impl MetricSource for TelemetryClient {
    fn fetch(&self, host: &str) -> impl Future<Output = Result<f64, FetchError>> + Send {
        self.get_metric(host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn endpoint_joins_base_url() {
        let http = HttpClient::new(Duration::from_secs(1));
        let client = TelemetryClient::new(http.clone(), "http://telemetry:9000/", vec![]);
        assert_eq!(client.endpoint(), "http://telemetry:9000/api/data");

        let client = TelemetryClient::new(http, "http://telemetry:9000", vec![]);
        assert_eq!(client.endpoint(), "http://telemetry:9000/api/data");
    }
}
