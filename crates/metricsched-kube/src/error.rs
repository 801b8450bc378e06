//! Orchestration API errors.

use metricsched_core::HttpError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KubeError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}
