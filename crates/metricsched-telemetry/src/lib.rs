//! metricsched-telemetry — per-host metric queries.
//!
//! One query per host against the time-series backend's `/api/data`
//! endpoint, covering the last 60 seconds at a 60 second sampling step.
//! Only the first sample of the first series is used.
//!
//! # Components
//!
//! - **`query`** — `MetricQuery`, the request body, and `extract_metric`
//! - **`client`** — `TelemetryClient`, the HTTP-backed `MetricSource`
//! - **`error`** — `FetchError`

pub mod client;
pub mod error;
pub mod query;

pub use client::{MetricSource, TelemetryClient};
pub use error::FetchError;
pub use query::{MetricQuery, MetricSpec, extract_metric};
