use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A distributed lease guarding mutating operations on one resource.
/// Stored at `/registry/leases/<resource>` in the control-plane store.
///
/// `generation` is the optimistic-concurrency token: renew, steal, and
/// release all pass the generation they last observed, and the store only
/// applies the change if it still matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaseRecord {
    /// Name of the protected resource (usually a namespace).
    pub resource: String,
    /// Identity of the process currently claiming the lease.
    pub holder: String,
    /// Bumped on every successful acquisition, steal, and renewal.
    pub generation: u64,
    /// When the current holder first acquired the lease.
    pub acquired_at: DateTime<Utc>,
    /// When the current hold lapses unless renewed.
    pub expires_at: DateTime<Utc>,
    /// Lease time-to-live in seconds.
    pub ttl_seconds: u64,
}

impl LeaseRecord {
    /// A fresh generation-0 record held by `holder`, valid for `ttl_seconds` from now.
    pub fn new(resource: &str, holder: &str, ttl_seconds: u64) -> Self {
        let now = Utc::now();
        Self {
            resource: resource.to_string(),
            holder: holder.to_string(),
            generation: 0,
            acquired_at: now,
            expires_at: now + chrono::Duration::seconds(ttl_seconds as i64),
            ttl_seconds,
        }
    }

    /// The record a new holder writes when taking over this lease.
    /// Generation continues from the observed record so the swap is detectable.
    pub fn takeover(&self, holder: &str, ttl_seconds: u64) -> Self {
        let now = Utc::now();
        Self {
            resource: self.resource.clone(),
            holder: holder.to_string(),
            generation: self.generation + 1,
            acquired_at: now,
            expires_at: now + chrono::Duration::seconds(ttl_seconds as i64),
            ttl_seconds,
        }
    }

    /// The record after one successful renewal: same holder, generation bumped,
    /// expiry pushed out by the TTL.
    pub fn renewed(&self) -> Self {
        Self {
            generation: self.generation + 1,
            expires_at: Utc::now() + chrono::Duration::seconds(self.ttl_seconds as i64),
            ..self.clone()
        }
    }

    /// Whether the hold has lapsed and the lease is eligible for takeover.
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Seconds until expiry; zero if already expired.
    pub fn remaining_secs(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_record_is_not_expired() {
        let lease = LeaseRecord::new("ns-a", "h1", 10);
        assert_eq!(lease.generation, 0);
        assert!(!lease.is_expired());
        assert!(lease.remaining_secs() > 8);
    }

    #[test]
    fn past_expiry_is_expired() {
        let mut lease = LeaseRecord::new("ns-a", "h1", 10);
        lease.expires_at = Utc::now() - chrono::Duration::seconds(1);
        assert!(lease.is_expired());
        assert_eq!(lease.remaining_secs(), 0);
    }

    #[test]
    fn renewal_bumps_generation_and_extends_expiry() {
        let lease = LeaseRecord::new("ns-a", "h1", 10);
        let renewed = lease.renewed();
        assert_eq!(renewed.generation, 1);
        assert_eq!(renewed.holder, "h1");
        assert_eq!(renewed.acquired_at, lease.acquired_at);
        assert!(renewed.expires_at >= lease.expires_at);
    }

    #[test]
    fn takeover_continues_the_generation_sequence() {
        let lease = LeaseRecord::new("ns-a", "h1", 10);
        let stolen = lease.takeover("h2", 30);
        assert_eq!(stolen.generation, 1);
        assert_eq!(stolen.holder, "h2");
        assert_eq!(stolen.resource, "ns-a");
        assert_eq!(stolen.ttl_seconds, 30);
    }
}
