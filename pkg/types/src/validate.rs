use anyhow::{Result, bail};

/// Validate a namespace or node name.
/// Rules: lowercase `[a-z0-9-]`, max 63 chars, no leading/trailing hyphens.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("name must not be empty");
    }
    if name.len() > 63 {
        bail!("name '{}' exceeds 63 characters (got {})", name, name.len());
    }
    if name.starts_with('-') || name.ends_with('-') {
        bail!("name '{}' must not start or end with a hyphen", name);
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
    {
        bail!(
            "name '{}' contains '{}'; only lowercase letters, digits, and hyphens [a-z0-9-] are allowed",
            name,
            bad
        );
    }
    Ok(())
}

/// Validate a requested consensus-node count.
pub fn validate_node_count(count: u32) -> Result<()> {
    if count == 0 {
        bail!("a network needs at least one consensus node");
    }
    if count > 50 {
        bail!("node count {} exceeds the supported maximum of 50", count);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        assert!(validate_name("ledger-dev").is_ok());
        assert!(validate_name("node-0").is_ok());
        assert!(validate_name("a").is_ok());
        assert!(validate_name("net-123-b").is_ok());
    }

    #[test]
    fn invalid_names() {
        assert!(validate_name("").is_err());
        assert!(validate_name("Ledger").is_err());
        assert!(validate_name("ledger_dev").is_err());
        assert!(validate_name("-leading").is_err());
        assert!(validate_name("trailing-").is_err());
        assert!(validate_name("dot.name").is_err());
        assert!(validate_name(&"a".repeat(64)).is_err());
    }

    #[test]
    fn node_counts() {
        assert!(validate_node_count(1).is_ok());
        assert!(validate_node_count(50).is_ok());
        assert!(validate_node_count(0).is_err());
        assert!(validate_node_count(51).is_err());
    }
}
