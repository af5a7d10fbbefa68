use pkg_constants::network::{
    CONSENSUS_NODE_IMAGE, GOSSIP_PORT, GRPC_PORT, MANAGED_BY_LABEL, MANAGED_BY_VALUE,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::pod::Pod;

/// One consensus node of a deployed ledger network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusNode {
    /// Node name, unique within the namespace (e.g. "node-0").
    pub name: String,
    /// Namespace the node's resources live in.
    pub namespace: String,
    /// Consensus software release tag the node runs.
    pub release_tag: String,
}

impl ConsensusNode {
    pub fn new(name: &str, namespace: &str, release_tag: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            release_tag: release_tag.to_string(),
        }
    }

    /// Name of the pod backing this node.
    pub fn pod_name(&self) -> String {
        pod_name(&self.name)
    }

    /// Name of the secret carrying this node's bootstrap material.
    pub fn secret_name(&self) -> String {
        secret_name(&self.name)
    }

    /// Render the consensus-node pod for this node.
    pub fn pod(&self) -> Pod {
        let mut labels = HashMap::new();
        labels.insert(MANAGED_BY_LABEL.to_string(), MANAGED_BY_VALUE.to_string());
        labels.insert("ledger.io/node".to_string(), self.name.clone());

        let mut env = HashMap::new();
        env.insert("NODE_NAME".to_string(), self.name.clone());

        Pod {
            name: self.pod_name(),
            namespace: self.namespace.clone(),
            image: format!("{}:{}", CONSENSUS_NODE_IMAGE, self.release_tag),
            labels,
            env,
            ports: vec![GOSSIP_PORT, GRPC_PORT],
            status: None,
            created_at: chrono::Utc::now(),
        }
    }
}

/// Pod name for a consensus node, derivable without the full node spec.
pub fn pod_name(node_name: &str) -> String {
    format!("network-{}", node_name)
}

/// Secret name for a consensus node, derivable without the full node spec.
pub fn secret_name(node_name: &str) -> String {
    format!("{}-keys", node_name)
}

/// Node name recovered from a pod name, if the pod backs a consensus node.
pub fn node_name_from_pod(pod_name: &str) -> Option<&str> {
    pod_name.strip_prefix("network-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_name_round_trips_through_the_pod_name() {
        assert_eq!(node_name_from_pod(&pod_name("node-4")), Some("node-4"));
        assert_eq!(node_name_from_pod("not-a-node-pod"), None);
    }

    #[test]
    fn pod_carries_release_tag_and_ports() {
        let node = ConsensusNode::new("node-2", "ledger-dev", "v0.59.0");
        let pod = node.pod();
        assert_eq!(pod.name, "network-node-2");
        assert_eq!(pod.namespace, "ledger-dev");
        assert!(pod.image.ends_with(":v0.59.0"));
        assert!(pod.ports.contains(&GOSSIP_PORT));
        assert_eq!(pod.labels.get("ledger.io/node").unwrap(), "node-2");
    }
}
