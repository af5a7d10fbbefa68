//! Centralized constants for the ledgerctl project.
//!
//! All project-wide constant values live here.
//! Change a value in one place and it applies everywhere.

pub mod lease;
pub mod network;
pub mod paths;
