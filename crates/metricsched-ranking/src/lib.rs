//! metricsched-ranking — picks the best node for a pod by telemetry metric.
//!
//! # Architecture
//!
//! ```text
//! RankingEngine
//!   ├── pass lock (one ranking pass at a time)
//!   ├── NodeCache (ready-node list + best node keyed by node set)
//!   └── MetricSource fan-out
//!       ├── one task per candidate, short host form as the key
//!       ├── semaphore caps in-flight queries
//!       └── every task joined before selection
//! ```
//!
//! Selection sorts measured nodes by metric ascending and takes the first
//! (lower is better) or the last (higher is better). Nodes whose query
//! failed are logged and left out.

pub mod cache;
pub mod engine;
pub mod error;
pub mod node;

pub use cache::{NodeCache, NodeSet};
pub use engine::{RankingEngine, RankingOptions, RankingPass};
pub use error::{RankingError, RankingResult};
pub use node::{Node, NodeList, short_host};
