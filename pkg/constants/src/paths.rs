//! Filesystem path constants.

// ─── CLI ───────────────────────────────────────────────────────────────────

/// Default config file path for the CLI.
pub const DEFAULT_CLI_CONFIG: &str = "/etc/ledgerctl/config.yaml";
