//! Two-slot node cache.
//!
//! Holds the last ready-node list and the last best node together with the
//! node set it was computed from. There is no expiry: a best node is stale
//! as soon as it is asked about a different node set.

use std::collections::BTreeSet;

use tokio::sync::RwLock;
use tracing::debug;

use crate::node::Node;

/// Order-insensitive view of a node-name list. Duplicates collapse.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeSet(BTreeSet<String>);

impl NodeSet {
    pub fn new<S: AsRef<str>>(names: &[S]) -> Self {
        Self(names.iter().map(|n| n.as_ref().to_string()).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }
}

#[derive(Debug, Default)]
struct Slots {
    ready_nodes: Option<Vec<String>>,
    best: Option<(NodeSet, Node)>,
}

/// Shared between the node lister and the ranking engine, usually as
/// `Arc<NodeCache>`.
#[derive(Debug, Default)]
pub struct NodeCache {
    slots: RwLock<Slots>,
}

impl NodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn ready_nodes(&self) -> Option<Vec<String>> {
        self.slots.read().await.ready_nodes.clone()
    }

    pub async fn set_ready_nodes(&self, nodes: Vec<String>) {
        let mut slots = self.slots.write().await;
        debug!(count = nodes.len(), "ready nodes cached");
        slots.ready_nodes = Some(nodes);
    }

    pub async fn invalidate_ready_nodes(&self) {
        self.slots.write().await.ready_nodes = None;
    }

    /// The cached best node, if it was computed from exactly this node set.
    pub async fn best_for<S: AsRef<str>>(&self, nodes: &[S]) -> Option<Node> {
        let slots = self.slots.read().await;
        let (set, node) = slots.best.as_ref()?;
        (*set == NodeSet::new(nodes)).then(|| node.clone())
    }

    /// Replace the best-node entry, keyed by the set that produced it.
    pub async fn set_best<S: AsRef<str>>(&self, nodes: &[S], best: Node) {
        let set = NodeSet::new(nodes);
        let mut slots = self.slots.write().await;
        debug!(node = %best.name, candidates = set.len(), "best node cached");
        slots.best = Some((set, best));
    }

    pub async fn invalidate_best(&self) {
        self.slots.write().await.best = None;
    }

    /// Clear both slots.
    pub async fn invalidate(&self) {
        let mut slots = self.slots.write().await;
        slots.ready_nodes = None;
        slots.best = None;
    }
}
