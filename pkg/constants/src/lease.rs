//! Deployment lease constants.

/// etcd-style key prefix for deployment lease records.
/// Full key = `LEASE_KEY_PREFIX + resource name` (usually a namespace).
pub const LEASE_KEY_PREFIX: &str = "/registry/leases/";

/// How long a deployment lease is valid without renewal, in seconds.
pub const DEFAULT_LEASE_TTL_SECS: u64 = 20;

/// A held lease is renewed every `TTL / LEASE_RENEW_INTERVAL_DIVISOR` seconds,
/// leaving at least one retry window before true expiry.
pub const LEASE_RENEW_INTERVAL_DIVISOR: u32 = 3;

/// Initial backoff when polling a busy lease or retrying the store, in milliseconds.
pub const LEASE_BACKOFF_BASE_MS: u64 = 200;

/// Backoff ceiling for lease polling and store retries, in milliseconds.
pub const LEASE_BACKOFF_CAP_MS: u64 = 5_000;

/// How many times a transient store failure is retried during acquisition
/// before it is surfaced to the caller.
pub const LEASE_STORE_RETRY_ATTEMPTS: u32 = 3;

/// How long `stop()` waits for an in-flight renewal call before abandoning it,
/// in milliseconds.
pub const LEASE_STOP_GRACE_MS: u64 = 2_000;
