//! metricsched.toml configuration.
//!
//! Every key is optional; a missing file section falls back to
//! `SchedConfig::default()`. Durations are written as `"5s"`, `"500ms"`,
//! `"1m"` or a plain number of seconds.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedConfig {
    /// Base URL of the telemetry backend (`/api/data` is appended).
    pub telemetry_url: String,
    /// Metric ids requested per host. Only the first value of the first
    /// series is used for ranking.
    pub metrics: Vec<String>,
    /// Pick the node with the lowest metric instead of the highest.
    pub lower_is_better: bool,
    /// Base URL of the orchestration API, e.g. a `kubectl proxy` endpoint.
    pub kube_url: String,
    /// Pods whose `spec.schedulerName` matches this are scheduled by us.
    pub scheduler_name: String,
    /// How often the daemon looks for pending pods.
    pub poll_interval: String,
    /// How long the cached ready-node list is reused by the daemon.
    pub node_refresh_interval: String,
    /// Per-request HTTP timeout for both backends.
    pub request_timeout: String,
    /// Maximum telemetry queries in flight during one ranking pass.
    pub max_concurrency: usize,
}

impl Default for SchedConfig {
    fn default() -> Self {
        Self {
            telemetry_url: "http://127.0.0.1:9000".to_string(),
            metrics: vec!["cpu.used.percent".to_string()],
            lower_is_better: false,
            kube_url: "http://127.0.0.1:8001".to_string(),
            scheduler_name: "metricsched".to_string(),
            poll_interval: "5s".to_string(),
            node_refresh_interval: "60s".to_string(),
            request_timeout: "10s".to_string(),
            max_concurrency: 32,
        }
    }
}

impl SchedConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: SchedConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values a parse alone cannot reject.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.metrics.is_empty() {
            return Err(ConfigError::Invalid {
                key: "metrics",
                reason: "at least one metric id is required".to_string(),
            });
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: "max_concurrency",
                reason: "must be greater than zero".to_string(),
            });
        }
        self.poll_interval()?;
        self.node_refresh_interval()?;
        self.request_timeout()?;
        Ok(())
    }

    pub fn poll_interval(&self) -> Result<Duration, ConfigError> {
        duration_field("poll_interval", &self.poll_interval)
    }

    pub fn node_refresh_interval(&self) -> Result<Duration, ConfigError> {
        duration_field("node_refresh_interval", &self.node_refresh_interval)
    }

    pub fn request_timeout(&self) -> Result<Duration, ConfigError> {
        duration_field("request_timeout", &self.request_timeout)
    }
}

fn duration_field(key: &'static str, value: &str) -> Result<Duration, ConfigError> {
    parse_duration(value).ok_or_else(|| ConfigError::InvalidDuration {
        key,
        value: value.to_string(),
    })
}

/// Parse a duration string like "5s", "500ms", "1m".
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>().ok().map(|m| Duration::from_secs(m * 60))
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
