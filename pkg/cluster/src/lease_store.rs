use async_trait::async_trait;
use pkg_lease::store::{
    CreateOutcome, DeleteOutcome, LeaseStore, StoreUnavailable, UpdateOutcome,
};
use pkg_types::lease::LeaseRecord;
use reqwest::StatusCode;

use crate::client::ClusterClient;

/// Lease store backed by the control plane's lease API.
///
/// The expected generation travels as a precondition on every write; the
/// server only applies a change when the stored generation still matches and
/// answers 409 with the current record otherwise. That maps the store's
/// native optimistic concurrency onto the CAS contract the algorithms need.
pub struct ClusterLeaseStore {
    client: ClusterClient,
}

impl ClusterLeaseStore {
    pub fn new(client: ClusterClient) -> Self {
        Self { client }
    }

    fn lease_url(&self, resource: &str) -> String {
        self.client.url(&format!("/api/v1/leases/{}", resource))
    }

    /// Parse the current record out of a 409 conflict body.
    async fn conflict_record(resp: reqwest::Response) -> Result<LeaseRecord, StoreUnavailable> {
        resp.json()
            .await
            .map_err(|e| StoreUnavailable(format!("malformed conflict body: {}", e)))
    }
}

fn transport(e: reqwest::Error) -> StoreUnavailable {
    StoreUnavailable(e.to_string())
}

#[async_trait]
impl LeaseStore for ClusterLeaseStore {
    async fn read(&self, resource: &str) -> Result<Option<LeaseRecord>, StoreUnavailable> {
        let resp = self
            .client
            .http()
            .get(self.lease_url(resource))
            .send()
            .await
            .map_err(transport)?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => Ok(Some(resp.json().await.map_err(transport)?)),
            s => Err(StoreUnavailable(format!("lease read returned {}", s))),
        }
    }

    async fn create_if_absent(
        &self,
        record: &LeaseRecord,
    ) -> Result<CreateOutcome, StoreUnavailable> {
        let resp = self
            .client
            .http()
            .post(self.client.url("/api/v1/leases"))
            .json(record)
            .send()
            .await
            .map_err(transport)?;
        match resp.status() {
            StatusCode::CONFLICT => Ok(CreateOutcome::AlreadyExists(
                Self::conflict_record(resp).await?,
            )),
            s if s.is_success() => Ok(CreateOutcome::Created),
            s => Err(StoreUnavailable(format!("lease create returned {}", s))),
        }
    }

    async fn compare_and_swap(
        &self,
        expected_generation: u64,
        record: &LeaseRecord,
    ) -> Result<UpdateOutcome, StoreUnavailable> {
        let resp = self
            .client
            .http()
            .put(self.lease_url(&record.resource))
            .query(&[("expected-generation", expected_generation)])
            .json(record)
            .send()
            .await
            .map_err(transport)?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(UpdateOutcome::NotFound),
            StatusCode::CONFLICT => Ok(UpdateOutcome::Conflict(
                Self::conflict_record(resp).await?,
            )),
            s if s.is_success() => Ok(UpdateOutcome::Updated),
            s => Err(StoreUnavailable(format!("lease update returned {}", s))),
        }
    }

    async fn delete(
        &self,
        resource: &str,
        expected_generation: u64,
    ) -> Result<DeleteOutcome, StoreUnavailable> {
        let resp = self
            .client
            .http()
            .delete(self.lease_url(resource))
            .query(&[("expected-generation", expected_generation)])
            .send()
            .await
            .map_err(transport)?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(DeleteOutcome::NotFound),
            StatusCode::CONFLICT => Ok(DeleteOutcome::Conflict(
                Self::conflict_record(resp).await?,
            )),
            s if s.is_success() => Ok(DeleteOutcome::Deleted),
            s => Err(StoreUnavailable(format!("lease delete returned {}", s))),
        }
    }
}
