//! Node measurements and metric ordering.

use serde::Serialize;

/// One candidate node after its telemetry query.
///
/// Exactly one of `metric` / `error` is set by the constructors. A node
/// with an error never takes part in selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Node {
    pub fn measured(name: impl Into<String>, metric: f64) -> Self {
        Self {
            name: name.into(),
            metric: Some(metric),
            error: None,
        }
    }

    pub fn failed(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metric: None,
            error: Some(error.into()),
        }
    }

    /// The metric, if this node can be ranked. NaN counts as no value.
    pub fn rankable_metric(&self) -> Option<f64> {
        match (self.metric, &self.error) {
            (Some(m), None) if !m.is_nan() => Some(m),
            _ => None,
        }
    }
}

/// Measured nodes sorted by metric, lowest first.
///
/// Built only from ranking output; equal metrics keep the order in which
/// the nodes were handed in.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NodeList(Vec<Node>);

impl NodeList {
    /// Keep rankable nodes and sort them by metric ascending.
    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        let mut ranked: Vec<Node> = nodes
            .into_iter()
            .filter(|n| n.rankable_metric().is_some())
            .collect();
        // Stable sort: ties stay in submission order.
        ranked.sort_by(|a, b| {
            let (a, b) = (a.rankable_metric(), b.rankable_metric());
            a.unwrap_or_default().total_cmp(&b.unwrap_or_default())
        });
        Self(ranked)
    }

    /// Lowest metric when `lower_is_better`, otherwise highest.
    pub fn best(&self, lower_is_better: bool) -> Option<&Node> {
        if lower_is_better {
            self.0.first()
        } else {
            self.0.last()
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<Node> {
        self.0
    }
}

impl<'a> IntoIterator for &'a NodeList {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Node name up to its first `.`; the whole name if it has none.
pub fn short_host(node_name: &str) -> &str {
    node_name.split('.').next().unwrap_or(node_name)
}
