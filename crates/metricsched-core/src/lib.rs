//! metricsched-core — configuration and HTTP transport shared by the
//! metricsched crates.
//!
//! - **`config`** — `SchedConfig`, loaded from TOML with defaults for every key
//! - **`http`** — `HttpClient`, a small JSON-over-HTTP/1 client on hyper used
//!   for both the telemetry backend and the orchestration API

pub mod config;
pub mod error;
pub mod http;

pub use config::{SchedConfig, parse_duration};
pub use error::{ConfigError, HttpError};
pub use http::{HttpClient, HttpResponse};
