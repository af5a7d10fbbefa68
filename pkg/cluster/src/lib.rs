//! Client for the cluster control-plane API: namespace, secret, and pod
//! operations consumed by deployment commands, plus the control-plane-backed
//! lease store.

mod client;
mod lease_store;

pub use client::ClusterClient;
pub use lease_store::ClusterLeaseStore;
