use thiserror::Error;

/// Failures surfaced by the lease subsystem.
///
/// `Busy` and `BackendUnavailable` are reported synchronously, before any
/// cluster mutation begins. `Lost` is delivered asynchronously through the
/// [`LeaseGuard`](crate::LeaseGuard) while an operation is in flight.
#[derive(Debug, Error)]
pub enum LeaseError {
    /// The resource is actively held by another process.
    #[error(
        "the deployment lease on '{resource}' is held by {holder} (expires in {remaining_secs}s); \
         wait for that operation to finish, or re-run with --force-lease to take it over"
    )]
    Busy {
        resource: String,
        holder: String,
        remaining_secs: i64,
    },

    /// The lease store could not be reached, even after retries.
    #[error("lease store unavailable: {0}")]
    BackendUnavailable(String),

    /// Exclusivity was lost while an operation was running. The operation is
    /// aborted; re-running the whole command re-acquires from scratch.
    #[error(
        "lost the deployment lease on '{resource}' while the operation was running; \
         the operation was aborted and the command should be re-run"
    )]
    Lost { resource: String },

    /// Misuse of the lease API. A local defect, never retried.
    #[error("invalid lease state: {0}")]
    InvalidState(String),
}
