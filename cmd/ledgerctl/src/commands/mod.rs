//! Mutating deployment commands. Every command here acquires the namespace's
//! deployment lease before touching the cluster and checks the lease guard
//! before each mutating step.

pub mod network;
pub mod node;
