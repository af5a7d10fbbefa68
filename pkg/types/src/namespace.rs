use chrono::{DateTime, Utc};
use pkg_constants::network::{MANAGED_BY_LABEL, MANAGED_BY_VALUE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Namespace {
    pub name: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
}

impl Namespace {
    /// A namespace labelled as managed by this tool.
    pub fn managed(name: &str) -> Self {
        let mut labels = HashMap::new();
        labels.insert(MANAGED_BY_LABEL.to_string(), MANAGED_BY_VALUE.to_string());
        Self {
            name: name.to_string(),
            labels,
            created_at: Utc::now(),
        }
    }
}
