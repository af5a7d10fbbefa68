use std::time::Duration;

use pkg_constants::lease::{
    DEFAULT_LEASE_TTL_SECS, LEASE_BACKOFF_BASE_MS, LEASE_BACKOFF_CAP_MS,
    LEASE_RENEW_INTERVAL_DIVISOR, LEASE_STOP_GRACE_MS, LEASE_STORE_RETRY_ATTEMPTS,
};

/// Tuning for lease acquisition and renewal.
///
/// Defaults come from `pkg-constants`; commands override the TTL and wait
/// window per invocation through flags.
#[derive(Debug, Clone)]
pub struct LeaseConfig {
    /// Lease time-to-live in seconds.
    pub ttl_seconds: u64,
    /// A held lease is renewed every `ttl / renew_divisor`, leaving at least
    /// one retry window before true expiry.
    pub renew_divisor: u32,
    /// Initial backoff for busy-lease polling and transient store retries.
    pub backoff_base: Duration,
    /// Backoff ceiling.
    pub backoff_cap: Duration,
    /// Transient store failures tolerated per acquisition step before the
    /// failure is surfaced.
    pub store_retry_attempts: u32,
    /// How long stopping the renewal task waits for an in-flight call.
    pub stop_grace: Duration,
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_LEASE_TTL_SECS,
            renew_divisor: LEASE_RENEW_INTERVAL_DIVISOR,
            backoff_base: Duration::from_millis(LEASE_BACKOFF_BASE_MS),
            backoff_cap: Duration::from_millis(LEASE_BACKOFF_CAP_MS),
            store_retry_attempts: LEASE_STORE_RETRY_ATTEMPTS,
            stop_grace: Duration::from_millis(LEASE_STOP_GRACE_MS),
        }
    }
}

impl LeaseConfig {
    /// Interval between renewal attempts for a held lease.
    pub fn renew_interval(&self) -> Duration {
        Duration::from_secs((self.ttl_seconds / self.renew_divisor as u64).max(1))
    }

    /// The backoff to use after `current`: doubled, capped.
    pub fn next_backoff(&self, current: Duration) -> Duration {
        (current * 2).min(self.backoff_cap)
    }
}
