//! Orchestration API object shapes.
//!
//! Only the fields the scheduler reads are modelled; everything else in
//! the API objects is ignored on decode.

use serde::{Deserialize, Serialize};

/// Namespace used for bindings when the pod's namespace is empty.
pub const DEFAULT_NAMESPACE: &str = "default";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NodeCondition {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NodeStatus {
    #[serde(default)]
    pub conditions: Vec<NodeCondition>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KubeNode {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub status: NodeStatus,
}

impl KubeNode {
    /// Whether the node reports `Ready` = `True`.
    pub fn is_ready(&self) -> bool {
        self.status
            .conditions
            .iter()
            .any(|c| c.kind == "Ready" && c.status == "True")
    }
}

#[derive(Debug, Deserialize)]
pub struct NodeListResponse {
    #[serde(default)]
    pub items: Vec<KubeNode>,
}

/// Names of the ready nodes, in listing order.
pub fn ready_node_names(nodes: &[KubeNode]) -> Vec<String> {
    nodes
        .iter()
        .filter(|n| n.is_ready())
        .map(|n| n.metadata.name.clone())
        .collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    #[serde(default)]
    pub scheduler_name: Option<String>,
    #[serde(default)]
    pub node_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PodStatus {
    #[serde(default)]
    pub phase: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pod {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: PodSpec,
    #[serde(default)]
    pub status: PodStatus,
}

impl Pod {
    /// Pending, unassigned, and ours.
    pub fn awaits_scheduler(&self, scheduler_name: &str) -> bool {
        self.status.phase.as_deref() == Some("Pending")
            && self.spec.node_name.as_deref().unwrap_or_default().is_empty()
            && self.spec.scheduler_name.as_deref() == Some(scheduler_name)
    }
}

#[derive(Debug, Deserialize)]
pub struct PodListResponse {
    #[serde(default)]
    pub items: Vec<Pod>,
}

/// A pod waiting to be placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PodRef {
    pub name: String,
    pub namespace: String,
}

impl From<&Pod> for PodRef {
    fn from(pod: &Pod) -> Self {
        Self {
            name: pod.metadata.name.clone(),
            namespace: pod
                .metadata
                .namespace
                .clone()
                .filter(|ns| !ns.is_empty())
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingTarget {
    pub kind: String,
    pub api_version: String,
    pub name: String,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BindingMeta {
    pub name: String,
    pub namespace: String,
}

/// Body of a `bindings` create call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Binding {
    pub target: BindingTarget,
    pub metadata: BindingMeta,
}

impl Binding {
    /// Bind `pod` to `node`. An empty namespace becomes `"default"`.
    pub fn new(pod: &str, node: &str, namespace: &str) -> Self {
        let namespace = if namespace.is_empty() {
            DEFAULT_NAMESPACE
        } else {
            namespace
        };
        Self {
            target: BindingTarget {
                kind: "Node".to_string(),
                api_version: "v1".to_string(),
                name: node.to_string(),
                namespace: namespace.to_string(),
            },
            metadata: BindingMeta {
                name: pod.to_string(),
                namespace: namespace.to_string(),
            },
        }
    }

    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }
}
