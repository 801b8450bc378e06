//! Ready-node listing backed by the shared `NodeCache`.

use std::sync::Arc;

use metricsched_ranking::NodeCache;
use tracing::{debug, warn};

use crate::client::NodeSource;
use crate::types::ready_node_names;

pub struct ReadyNodeLister<N: NodeSource> {
    source: Arc<N>,
    cache: Arc<NodeCache>,
}

impl<N: NodeSource> ReadyNodeLister<N> {
    pub fn new(source: Arc<N>, cache: Arc<NodeCache>) -> Self {
        Self { source, cache }
    }

    /// Ready node names, from the cache when populated.
    ///
    /// A listing failure is logged and yields an empty list, which is not
    /// cached so the next call lists again.
    pub async fn ready_nodes(&self) -> Vec<String> {
        if let Some(nodes) = self.cache.ready_nodes().await {
            debug!(count = nodes.len(), "using cached ready nodes");
            return nodes;
        }

        match self.source.list_nodes().await {
            Ok(nodes) => {
                let ready = ready_node_names(&nodes);
                debug!(total = nodes.len(), ready = ready.len(), "ready nodes listed");
                self.cache.set_ready_nodes(ready.clone()).await;
                ready
            }
            Err(e) => {
                warn!(error = %e, "failed to list nodes");
                Vec::new()
            }
        }
    }
}
