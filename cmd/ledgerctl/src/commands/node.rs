use anyhow::bail;
use pkg_cluster::ClusterClient;
use pkg_lease::{LeaseManager, LeaseOptions};
use pkg_types::node::{ConsensusNode, pod_name, secret_name};
use pkg_types::validate::validate_name;
use tracing::info;

use super::network::bootstrap_secret;

/// Add a consensus node to a deployed network.
pub async fn add(
    client: &ClusterClient,
    leases: &LeaseManager,
    node: ConsensusNode,
    opts: LeaseOptions,
) -> anyhow::Result<()> {
    validate_name(&node.namespace)?;
    validate_name(&node.name)?;

    let resource = node.namespace.clone();
    leases
        .with_lease(&resource, opts, |guard| async move {
            guard.check()?;
            if !client.namespace_exists(&node.namespace).await? {
                bail!(
                    "namespace '{}' does not exist; deploy a network first",
                    node.namespace
                );
            }
            let pods = client.list_pods(&node.namespace).await?;
            if pods.iter().any(|p| p.name == node.pod_name()) {
                bail!("node '{}' already exists in '{}'", node.name, node.namespace);
            }

            guard.check()?;
            client.create_secret(&bootstrap_secret(&node)).await?;
            client.create_pod(&node.pod()).await?;

            println!(
                "Added consensus node {} to namespace {}",
                node.name, node.namespace
            );
            Ok(())
        })
        .await
}

/// Remove a consensus node and its bootstrap secret.
pub async fn delete(
    client: &ClusterClient,
    leases: &LeaseManager,
    namespace: String,
    name: String,
    opts: LeaseOptions,
) -> anyhow::Result<()> {
    validate_name(&namespace)?;
    validate_name(&name)?;

    let resource = namespace.clone();
    leases
        .with_lease(&resource, opts, |guard| async move {
            let pods = client.list_pods(&namespace).await?;
            if !pods.iter().any(|p| p.name == pod_name(&name)) {
                bail!("node '{}' does not exist in '{}'", name, namespace);
            }

            guard.check()?;
            client.delete_pod(&namespace, &pod_name(&name)).await?;

            guard.check()?;
            client.delete_secret(&namespace, &secret_name(&name)).await?;

            println!("Removed consensus node {} from namespace {}", name, namespace);
            Ok(())
        })
        .await
}

/// Replace a node's pod with one running a new release. The old pod is gone
/// before the new one starts, so the guard is re-checked in between.
pub async fn update(
    client: &ClusterClient,
    leases: &LeaseManager,
    node: ConsensusNode,
    opts: LeaseOptions,
) -> anyhow::Result<()> {
    validate_name(&node.namespace)?;
    validate_name(&node.name)?;

    let resource = node.namespace.clone();
    leases
        .with_lease(&resource, opts, |guard| async move {
            let pods = client.list_pods(&node.namespace).await?;
            if !pods.iter().any(|p| p.name == node.pod_name()) {
                bail!("node '{}' does not exist in '{}'", node.name, node.namespace);
            }

            info!(
                "Moving node {} in '{}' to release {}",
                node.name, node.namespace, node.release_tag
            );

            guard.check()?;
            client.delete_pod(&node.namespace, &node.pod_name()).await?;

            guard.check()?;
            client.create_pod(&node.pod()).await?;

            println!(
                "Updated consensus node {} to release {}",
                node.name, node.release_tag
            );
            Ok(())
        })
        .await
}
