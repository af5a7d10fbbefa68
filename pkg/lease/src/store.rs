use async_trait::async_trait;
use pkg_types::lease::LeaseRecord;
use thiserror::Error;

/// Transient failure reaching the lease store.
///
/// Contention outcomes (conflict, not-found) are data, not errors; they live
/// in the outcome enums below. This error means the store gave no answer at
/// all, and callers decide how long to keep retrying.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StoreUnavailable(pub String);

/// Outcome of a conditional create.
#[derive(Debug)]
pub enum CreateOutcome {
    Created,
    /// A record already exists; the current one is returned for inspection.
    AlreadyExists(LeaseRecord),
}

/// Outcome of a generation-checked update.
#[derive(Debug)]
pub enum UpdateOutcome {
    Updated,
    /// The stored generation no longer matches; the current record is returned.
    Conflict(LeaseRecord),
    NotFound,
}

/// Outcome of a generation-checked delete.
#[derive(Debug)]
pub enum DeleteOutcome {
    Deleted,
    /// The stored generation no longer matches; the current record is returned.
    Conflict(LeaseRecord),
    NotFound,
}

/// Storage backend for lease records.
///
/// Implementations map the generation check onto whatever optimistic-
/// concurrency primitive the backend natively supports; the algorithms in
/// this crate never see anything but these four operations.
#[async_trait]
pub trait LeaseStore: Send + Sync {
    /// Read the current record for `resource`.
    async fn read(&self, resource: &str) -> Result<Option<LeaseRecord>, StoreUnavailable>;

    /// Write `record` only if no record exists for its resource.
    async fn create_if_absent(
        &self,
        record: &LeaseRecord,
    ) -> Result<CreateOutcome, StoreUnavailable>;

    /// Replace the stored record only if its generation is `expected_generation`.
    async fn compare_and_swap(
        &self,
        expected_generation: u64,
        record: &LeaseRecord,
    ) -> Result<UpdateOutcome, StoreUnavailable>;

    /// Delete the record for `resource` only if its generation is `expected_generation`.
    async fn delete(
        &self,
        resource: &str,
        expected_generation: u64,
    ) -> Result<DeleteOutcome, StoreUnavailable>;
}
