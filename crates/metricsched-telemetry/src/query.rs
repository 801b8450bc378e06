//! Telemetry request body and response extraction.

use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Window start, relative to now, in seconds.
pub const WINDOW_START: i64 = -60;
/// Window end, relative to now, in seconds.
pub const WINDOW_END: i64 = 0;
/// Sampling step in seconds; equal to the window, so one sample per series.
pub const SAMPLING: u64 = 60;
/// Data source the filter and grouping apply to.
pub const DATA_SOURCE: &str = "host";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregations {
    pub time: String,
    pub group: String,
}

impl Default for Aggregations {
    fn default() -> Self {
        Self {
            time: "avg".to_string(),
            group: "avg".to_string(),
        }
    }
}

/// One requested metric id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSpec {
    pub id: String,
    pub aggregations: Aggregations,
}

impl MetricSpec {
    pub fn averaged(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            aggregations: Aggregations::default(),
        }
    }
}

/// Body of a `/api/data` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricQuery {
    pub metrics: Vec<MetricSpec>,
    pub data_source_type: String,
    pub start: i64,
    pub end: i64,
    pub sampling: u64,
    pub filter: String,
}

impl MetricQuery {
    /// Query the given metric ids for one bare host over the last minute.
    pub fn for_host<I, S>(metric_ids: I, host: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            metrics: metric_ids.into_iter().map(MetricSpec::averaged).collect(),
            data_source_type: DATA_SOURCE.to_string(),
            start: WINDOW_START,
            end: WINDOW_END,
            sampling: SAMPLING,
            filter: host_filter(host),
        }
    }
}

pub fn host_filter(host: &str) -> String {
    format!("host.hostName = '{host}'")
}

#[derive(Debug, Deserialize)]
struct DataResponse {
    #[serde(default)]
    data: Vec<Series>,
}

#[derive(Debug, Deserialize)]
struct Series {
    #[serde(default)]
    d: Vec<f64>,
}

/// Pull `data[0].d[0]` out of a response body.
///
/// A body with no series, or whose first series has no samples, is
/// `NoDataFound`; a zero sample is a valid value.
pub fn extract_metric(body: &[u8]) -> Result<f64, FetchError> {
    let response: DataResponse =
        serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    response
        .data
        .first()
        .and_then(|series| series.d.first())
        .copied()
        .ok_or(FetchError::NoDataFound)
}
