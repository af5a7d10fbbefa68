//! Distributed lease-based mutual exclusion for deployment commands.
//!
//! Mutating commands (network deploy/destroy, node add/delete/update) must
//! not run concurrently against the same namespace, including from separate
//! invocations on different machines. A lease record in the control-plane
//! store is the single source of truth for who may mutate. This crate
//! implements acquisition with expiry-gated takeover, background renewal
//! with loss detection, and the [`LeaseManager::with_lease`] façade that
//! commands run under.

mod acquire;
mod config;
mod error;
mod manager;
mod renewal;

pub mod memory;
pub mod store;

pub use config::LeaseConfig;
pub use error::LeaseError;
pub use manager::{LeaseGuard, LeaseManager, LeaseOptions};
