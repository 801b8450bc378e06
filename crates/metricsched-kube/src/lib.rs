//! metricsched-kube — the orchestration API side of scheduling.
//!
//! - **`types`** — the slices of the Node, Pod and Binding objects we read or write
//! - **`client`** — `KubeClient`: node listing, pending-pod listing, binding
//! - **`lister`** — `ReadyNodeLister`: ready node names, cached in `NodeCache`
//!
//! Binding responses are handed back raw; only transport failures are errors.

pub mod client;
pub mod error;
pub mod lister;
pub mod types;

pub use client::{Binder, KubeClient, NodeSource, PodSource};
pub use error::KubeError;
pub use lister::ReadyNodeLister;
pub use types::{Binding, KubeNode, NodeCondition, PodRef, ready_node_names};
