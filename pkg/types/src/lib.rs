//! Shared domain types for ledgerctl crates.

pub mod config;
pub mod lease;
pub mod namespace;
pub mod network;
pub mod node;
pub mod pod;
pub mod secret;
pub mod validate;
