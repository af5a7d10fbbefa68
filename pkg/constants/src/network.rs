//! Ledger network deployment constants.

/// Default control-plane API server address (HTTP).
pub const DEFAULT_API_ADDR: &str = "http://127.0.0.1:6443";

/// Default container image for a consensus node.
pub const CONSENSUS_NODE_IMAGE: &str = "ghcr.io/ledgerops/consensus-node";

/// Default consensus-node release tag deployed when none is given.
pub const DEFAULT_RELEASE_TAG: &str = "v0.58.1";

/// Default number of consensus nodes in a freshly deployed network.
pub const DEFAULT_NODE_COUNT: u32 = 3;

/// Gossip port exposed by every consensus-node pod.
pub const GOSSIP_PORT: u16 = 50111;

/// gRPC service port exposed by every consensus-node pod.
pub const GRPC_PORT: u16 = 50211;

/// Label applied to every resource this tool creates.
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";

/// Value of [`MANAGED_BY_LABEL`] for resources created by ledgerctl.
pub const MANAGED_BY_VALUE: &str = "ledgerctl";
