use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Secret {
    pub name: String,
    pub namespace: String,
    /// Secret data as opaque string values.
    pub data: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
}

impl Secret {
    pub fn new(name: &str, namespace: &str, data: HashMap<String, String>) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            data,
            created_at: Utc::now(),
        }
    }
}
