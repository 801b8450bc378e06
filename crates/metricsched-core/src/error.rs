//! Error types for configuration and HTTP transport.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while loading a `SchedConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid duration for `{key}`: {value:?}")]
    InvalidDuration { key: &'static str, value: String },

    #[error("invalid value for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Transport-level failures from `HttpClient`.
///
/// A non-2xx response is not an error at this layer; callers inspect
/// `HttpResponse::status` themselves.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid uri {uri:?}: {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: http::uri::InvalidUri,
    },

    #[error("failed to build request: {0}")]
    Build(#[from] http::Error),

    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("request to {uri} failed: {source}")]
    Request {
        uri: String,
        #[source]
        source: hyper_util::client::legacy::Error,
    },

    #[error("failed to read response body from {uri}: {source}")]
    Body {
        uri: String,
        #[source]
        source: hyper::Error,
    },

    #[error("request to {uri} timed out after {timeout:?}")]
    Timeout { uri: String, timeout: Duration },
}
