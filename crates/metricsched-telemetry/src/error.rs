//! Telemetry fetch errors.

use thiserror::Error;

/// Why a metric could not be obtained for a host.
///
/// All variants are per-host: a ranking pass logs them and excludes the
/// node rather than failing.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    /// Transport failure or a non-200 response.
    #[error("telemetry backend error: {0}")]
    Backend(String),

    #[error("malformed telemetry response: {0}")]
    Decode(String),

    /// The response parsed but carried no series or no samples.
    #[error("no data found")]
    NoDataFound,
}
