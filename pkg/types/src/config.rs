use serde::{Deserialize, Serialize};

/// CLI configuration file (YAML).
///
/// Example `config.yaml`:
/// ```yaml
/// server: http://10.0.0.1:6443
/// namespace: ledger-dev
/// release-tag: v0.58.1
/// lease-ttl-secs: 20
/// lease-wait-secs: 0
/// ```
///
/// Every field is optional; CLI flags take precedence over file values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfigFile {
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default, alias = "release-tag")]
    pub release_tag: Option<String>,
    #[serde(default, alias = "lease-ttl-secs")]
    pub lease_ttl_secs: Option<u64>,
    #[serde(default, alias = "lease-wait-secs")]
    pub lease_wait_secs: Option<u64>,
}

impl CliConfigFile {
    /// Load the YAML config file, returning defaults if the file doesn't exist.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_yaml::from_str(&content)?)
    }
}
