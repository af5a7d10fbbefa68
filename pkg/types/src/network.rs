use serde::{Deserialize, Serialize};

use crate::node::ConsensusNode;

/// Desired shape of a deployed ledger network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Namespace the network is deployed into.
    pub namespace: String,
    /// Number of consensus nodes.
    pub node_count: u32,
    /// Consensus software release tag.
    pub release_tag: String,
}

impl NetworkSpec {
    /// The consensus nodes this spec expands to: node-0 .. node-(n-1).
    pub fn nodes(&self) -> Vec<ConsensusNode> {
        (0..self.node_count)
            .map(|i| {
                ConsensusNode::new(&format!("node-{}", i), &self.namespace, &self.release_tag)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_expands_to_numbered_nodes() {
        let spec = NetworkSpec {
            namespace: "ledger-dev".to_string(),
            node_count: 3,
            release_tag: "v0.58.1".to_string(),
        };
        let nodes = spec.nodes();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].name, "node-0");
        assert_eq!(nodes[2].name, "node-2");
        assert!(nodes.iter().all(|n| n.namespace == "ledger-dev"));
    }
}
