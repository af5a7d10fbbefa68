use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use clap::{Args, Parser, Subcommand};
use pkg_cluster::{ClusterClient, ClusterLeaseStore};
use pkg_constants::lease::DEFAULT_LEASE_TTL_SECS;
use pkg_constants::network::{DEFAULT_API_ADDR, DEFAULT_NODE_COUNT, DEFAULT_RELEASE_TAG};
use pkg_constants::paths::DEFAULT_CLI_CONFIG;
use pkg_lease::{LeaseConfig, LeaseManager, LeaseOptions};
use pkg_types::config::CliConfigFile;
use pkg_types::network::NetworkSpec;
use pkg_types::node::ConsensusNode;

mod commands;

#[derive(Parser)]
#[command(
    name = "ledgerctl",
    about = "CLI tool for deploying and operating ledger networks"
)]
struct Cli {
    /// Control-plane API endpoint
    #[arg(long)]
    server: Option<String>,

    /// Path to YAML config file
    #[arg(long, default_value = DEFAULT_CLI_CONFIG)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy and tear down ledger networks
    Network {
        #[command(subcommand)]
        action: NetworkAction,
    },
    /// Manage consensus nodes in a deployed network
    Node {
        #[command(subcommand)]
        action: NodeAction,
    },
}

/// Flags controlling the deployment lease every mutating command runs under.
#[derive(Args, Debug, Clone)]
struct LeaseFlags {
    /// Seconds to wait for a busy deployment lease before giving up
    #[arg(long)]
    lease_wait_secs: Option<u64>,

    /// Lease time-to-live in seconds
    #[arg(long)]
    lease_ttl_secs: Option<u64>,

    /// Take over the deployment lease even if another operation still holds it
    #[arg(long)]
    force_lease: bool,
}

#[derive(Subcommand)]
enum NetworkAction {
    /// Deploy a ledger network into a namespace
    Deploy {
        #[arg(long)]
        namespace: Option<String>,
        /// Number of consensus nodes
        #[arg(long)]
        nodes: Option<u32>,
        /// Consensus software release tag
        #[arg(long)]
        release: Option<String>,
        #[command(flatten)]
        lease: LeaseFlags,
    },
    /// Destroy a deployed network and its namespace
    Destroy {
        #[arg(long)]
        namespace: Option<String>,
        #[command(flatten)]
        lease: LeaseFlags,
    },
}

#[derive(Subcommand)]
enum NodeAction {
    /// Add a consensus node to a deployed network
    Add {
        #[arg(long)]
        namespace: Option<String>,
        /// Node name (e.g. "node-3")
        #[arg(long)]
        node: String,
        /// Consensus software release tag
        #[arg(long)]
        release: Option<String>,
        #[command(flatten)]
        lease: LeaseFlags,
    },
    /// Remove a consensus node from a network
    Delete {
        #[arg(long)]
        namespace: Option<String>,
        #[arg(long)]
        node: String,
        #[command(flatten)]
        lease: LeaseFlags,
    },
    /// Replace a node's pod with a new release
    Update {
        #[arg(long)]
        namespace: Option<String>,
        #[arg(long)]
        node: String,
        /// Release tag to move the node to
        #[arg(long)]
        release: String,
        #[command(flatten)]
        lease: LeaseFlags,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let file_cfg = CliConfigFile::load(&cli.config)?;

    // Merge: CLI args > config file > defaults
    let server = cli
        .server
        .clone()
        .or(file_cfg.server.clone())
        .unwrap_or_else(|| DEFAULT_API_ADDR.to_string());

    let client = ClusterClient::new(&server)?;
    let store = Arc::new(ClusterLeaseStore::new(client.clone()));

    match cli.command {
        Commands::Network { action } => match action {
            NetworkAction::Deploy {
                namespace,
                nodes,
                release,
                lease,
            } => {
                let spec = NetworkSpec {
                    namespace: resolve_namespace(namespace, &file_cfg)?,
                    node_count: nodes.unwrap_or(DEFAULT_NODE_COUNT),
                    release_tag: resolve_release(release, &file_cfg),
                };
                let (manager, opts) = lease_setup(&lease, &file_cfg, store);
                commands::network::deploy(&client, &manager, spec, opts).await
            }
            NetworkAction::Destroy { namespace, lease } => {
                let namespace = resolve_namespace(namespace, &file_cfg)?;
                let (manager, opts) = lease_setup(&lease, &file_cfg, store);
                commands::network::destroy(&client, &manager, namespace, opts).await
            }
        },
        Commands::Node { action } => match action {
            NodeAction::Add {
                namespace,
                node,
                release,
                lease,
            } => {
                let namespace = resolve_namespace(namespace, &file_cfg)?;
                let node =
                    ConsensusNode::new(&node, &namespace, &resolve_release(release, &file_cfg));
                let (manager, opts) = lease_setup(&lease, &file_cfg, store);
                commands::node::add(&client, &manager, node, opts).await
            }
            NodeAction::Delete {
                namespace,
                node,
                lease,
            } => {
                let namespace = resolve_namespace(namespace, &file_cfg)?;
                let (manager, opts) = lease_setup(&lease, &file_cfg, store);
                commands::node::delete(&client, &manager, namespace, node, opts).await
            }
            NodeAction::Update {
                namespace,
                node,
                release,
                lease,
            } => {
                let namespace = resolve_namespace(namespace, &file_cfg)?;
                let node = ConsensusNode::new(&node, &namespace, &release);
                let (manager, opts) = lease_setup(&lease, &file_cfg, store);
                commands::node::update(&client, &manager, node, opts).await
            }
        },
    }
}

fn resolve_namespace(flag: Option<String>, file: &CliConfigFile) -> anyhow::Result<String> {
    match flag.or_else(|| file.namespace.clone()) {
        Some(ns) => Ok(ns),
        None => bail!("a namespace is required: pass --namespace or set it in the config file"),
    }
}

fn resolve_release(flag: Option<String>, file: &CliConfigFile) -> String {
    flag.or_else(|| file.release_tag.clone())
        .unwrap_or_else(|| DEFAULT_RELEASE_TAG.to_string())
}

/// Build the lease manager and per-invocation options from flags and config.
fn lease_setup(
    flags: &LeaseFlags,
    file: &CliConfigFile,
    store: Arc<ClusterLeaseStore>,
) -> (LeaseManager, LeaseOptions) {
    let config = LeaseConfig {
        ttl_seconds: flags
            .lease_ttl_secs
            .or(file.lease_ttl_secs)
            .unwrap_or(DEFAULT_LEASE_TTL_SECS),
        ..Default::default()
    };
    let wait = flags.lease_wait_secs.or(file.lease_wait_secs).unwrap_or(0);

    if flags.force_lease {
        eprintln!(
            "WARNING: --force-lease takes over the deployment lease even if another \
             operation is still running; only use this to recover from a crashed run"
        );
    }

    let opts = LeaseOptions {
        max_wait: Duration::from_secs(wait),
        force: flags.force_lease,
    };
    (LeaseManager::new(store, config), opts)
}
