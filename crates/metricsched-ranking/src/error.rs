//! Ranking error types.

use thiserror::Error;

/// Batch-level failures of a ranking pass.
///
/// Per-node telemetry failures never surface here; they are logged and the
/// node is dropped from the pass.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RankingError {
    #[error("empty node list")]
    EmptyNodeList,

    #[error("no node found")]
    NoNodeFound,
}

pub type RankingResult<T> = Result<T, RankingError>;
