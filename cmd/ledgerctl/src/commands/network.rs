use std::collections::HashMap;

use anyhow::bail;
use pkg_cluster::ClusterClient;
use pkg_lease::{LeaseManager, LeaseOptions};
use pkg_types::namespace::Namespace;
use pkg_types::network::NetworkSpec;
use pkg_types::node::{ConsensusNode, node_name_from_pod, secret_name};
use pkg_types::secret::Secret;
use pkg_types::validate::{validate_name, validate_node_count};
use tracing::info;
use uuid::Uuid;

/// Deploy a ledger network: the namespace, a bootstrap secret per node, and
/// one consensus pod per node.
pub async fn deploy(
    client: &ClusterClient,
    leases: &LeaseManager,
    spec: NetworkSpec,
    opts: LeaseOptions,
) -> anyhow::Result<()> {
    validate_name(&spec.namespace)?;
    validate_node_count(spec.node_count)?;

    let namespace = spec.namespace.clone();
    leases
        .with_lease(&namespace, opts, |guard| async move {
            info!(
                "Deploying a {}-node network into '{}'",
                spec.node_count, spec.namespace
            );

            guard.check()?;
            if client.namespace_exists(&spec.namespace).await? {
                bail!(
                    "namespace '{}' already exists; destroy it first or pick another name",
                    spec.namespace
                );
            }
            client
                .create_namespace(&Namespace::managed(&spec.namespace))
                .await?;

            for node in spec.nodes() {
                guard.check()?;
                client.create_secret(&bootstrap_secret(&node)).await?;
                client.create_pod(&node.pod()).await?;
            }

            println!(
                "Deployed {} consensus nodes into namespace {}",
                spec.node_count, spec.namespace
            );
            Ok(())
        })
        .await
}

/// Tear down a deployed network and its namespace.
pub async fn destroy(
    client: &ClusterClient,
    leases: &LeaseManager,
    namespace: String,
    opts: LeaseOptions,
) -> anyhow::Result<()> {
    validate_name(&namespace)?;

    let resource = namespace.clone();
    leases
        .with_lease(&resource, opts, |guard| async move {
            info!("Destroying the network in '{}'", namespace);

            guard.check()?;
            let pods = client.list_pods(&namespace).await?;
            for pod in &pods {
                guard.check()?;
                client.delete_pod(&namespace, &pod.name).await?;
            }

            // The bootstrap secrets belong to the nodes the pods backed.
            for pod in &pods {
                let Some(node) = node_name_from_pod(&pod.name) else {
                    continue;
                };
                guard.check()?;
                client.delete_secret(&namespace, &secret_name(node)).await?;
            }

            guard.check()?;
            client.delete_namespace(&namespace).await?;

            println!("Destroyed namespace {}", namespace);
            Ok(())
        })
        .await
}

/// Per-node bootstrap secret. Key and certificate material is produced by
/// external tooling; this only seeds the join token the node boots with.
pub(crate) fn bootstrap_secret(node: &ConsensusNode) -> Secret {
    let mut data = HashMap::new();
    data.insert(
        "bootstrap-token".to_string(),
        Uuid::new_v4().simple().to_string(),
    );
    Secret::new(&node.secret_name(), &node.namespace, data)
}
