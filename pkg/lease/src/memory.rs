use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use pkg_types::lease::LeaseRecord;
use tokio::sync::Mutex;

use crate::store::{
    CreateOutcome, DeleteOutcome, LeaseStore, StoreUnavailable, UpdateOutcome,
};

/// In-memory lease store for tests and local dry runs.
///
/// Implements the full CAS contract over a mutex-guarded map. The simulated
/// outage switch makes every operation fail with [`StoreUnavailable`] until
/// switched back, to exercise the transient-failure paths.
#[derive(Default)]
pub struct MemoryLeaseStore {
    records: Mutex<HashMap<String, LeaseRecord>>,
    unavailable: AtomicBool,
}

impl MemoryLeaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle the simulated outage.
    pub fn set_unavailable(&self, on: bool) {
        self.unavailable.store(on, Ordering::SeqCst);
    }

    /// Insert or replace a record directly, bypassing the CAS contract.
    pub async fn put(&self, record: LeaseRecord) {
        self.records
            .lock()
            .await
            .insert(record.resource.clone(), record);
    }

    /// Remove a record directly, bypassing the CAS contract.
    pub async fn remove(&self, resource: &str) {
        self.records.lock().await.remove(resource);
    }

    /// Snapshot the record for `resource`, ignoring the outage switch.
    pub async fn get(&self, resource: &str) -> Option<LeaseRecord> {
        self.records.lock().await.get(resource).cloned()
    }

    fn available(&self) -> Result<(), StoreUnavailable> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreUnavailable("simulated outage".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LeaseStore for MemoryLeaseStore {
    async fn read(&self, resource: &str) -> Result<Option<LeaseRecord>, StoreUnavailable> {
        self.available()?;
        Ok(self.records.lock().await.get(resource).cloned())
    }

    async fn create_if_absent(
        &self,
        record: &LeaseRecord,
    ) -> Result<CreateOutcome, StoreUnavailable> {
        self.available()?;
        let mut records = self.records.lock().await;
        match records.get(&record.resource) {
            Some(current) => Ok(CreateOutcome::AlreadyExists(current.clone())),
            None => {
                records.insert(record.resource.clone(), record.clone());
                Ok(CreateOutcome::Created)
            }
        }
    }

    async fn compare_and_swap(
        &self,
        expected_generation: u64,
        record: &LeaseRecord,
    ) -> Result<UpdateOutcome, StoreUnavailable> {
        self.available()?;
        let mut records = self.records.lock().await;
        match records.get(&record.resource) {
            None => Ok(UpdateOutcome::NotFound),
            Some(current) if current.generation != expected_generation => {
                Ok(UpdateOutcome::Conflict(current.clone()))
            }
            Some(_) => {
                records.insert(record.resource.clone(), record.clone());
                Ok(UpdateOutcome::Updated)
            }
        }
    }

    async fn delete(
        &self,
        resource: &str,
        expected_generation: u64,
    ) -> Result<DeleteOutcome, StoreUnavailable> {
        self.available()?;
        let mut records = self.records.lock().await;
        match records.get(resource) {
            None => Ok(DeleteOutcome::NotFound),
            Some(current) if current.generation != expected_generation => {
                Ok(DeleteOutcome::Conflict(current.clone()))
            }
            Some(_) => {
                records.remove(resource);
                Ok(DeleteOutcome::Deleted)
            }
        }
    }
}
