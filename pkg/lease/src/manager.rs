use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use pkg_types::lease::LeaseRecord;
use tokio::sync::{Mutex, watch};
use tracing::{info, warn};
use uuid::Uuid;

use crate::acquire::{AcquireRequest, acquire};
use crate::config::LeaseConfig;
use crate::error::LeaseError;
use crate::renewal;
use crate::store::{DeleteOutcome, LeaseStore};

/// Per-invocation acquisition options threaded from command flags.
#[derive(Debug, Clone, Default)]
pub struct LeaseOptions {
    /// How long to wait for a busy lease before failing. Zero fails fast.
    pub max_wait: Duration,
    /// Take over a live holder's lease. Operator escape hatch for a crashed
    /// holder that never released; races with a holder that is still alive.
    pub force: bool,
}

/// Cancellation handle passed to lease-guarded operations.
///
/// The operation must call [`check`](LeaseGuard::check) before each
/// cluster-mutating step and abort on error: once the lease is lost, another
/// process may already be mutating the same resources.
#[derive(Debug, Clone)]
pub struct LeaseGuard {
    resource: String,
    lost: watch::Receiver<bool>,
}

impl LeaseGuard {
    /// Fail with [`LeaseError::Lost`] once exclusivity has been lost.
    pub fn check(&self) -> Result<(), LeaseError> {
        if *self.lost.borrow() {
            Err(LeaseError::Lost {
                resource: self.resource.clone(),
            })
        } else {
            Ok(())
        }
    }

    /// Name of the resource this guard protects.
    pub fn resource(&self) -> &str {
        &self.resource
    }
}

/// Distributed mutual exclusion for mutating deployment commands.
///
/// [`with_lease`](LeaseManager::with_lease) is the only entry point: it
/// acquires the lease, keeps it renewed in the background, runs the
/// operation, and releases on every exit path. The store record is the
/// single source of truth; nothing about a held lease is trusted across
/// process boundaries, so every command invocation acquires afresh.
pub struct LeaseManager {
    store: Arc<dyn LeaseStore>,
    config: LeaseConfig,
}

impl LeaseManager {
    pub fn new(store: Arc<dyn LeaseStore>, config: LeaseConfig) -> Self {
        Self { store, config }
    }

    /// Run `op` while exclusively holding the deployment lease on `resource`.
    ///
    /// The lease is acquired before `op` starts (so a failure here has zero
    /// side effects), renewed in the background while `op` runs, and released
    /// when `op` returns, whether it succeeded, failed, or aborted after the
    /// guard reported loss.
    pub async fn with_lease<T, F, Fut>(
        &self,
        resource: &str,
        opts: LeaseOptions,
        op: F,
    ) -> anyhow::Result<T>
    where
        F: FnOnce(LeaseGuard) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        if resource.is_empty() {
            return Err(LeaseError::InvalidState(
                "cannot take a lease on an empty resource name".to_string(),
            )
            .into());
        }

        let holder = holder_id();
        info!(
            "Requesting deployment lease on '{}' as {}",
            resource, holder
        );
        let record = acquire(
            self.store.as_ref(),
            &self.config,
            AcquireRequest {
                resource,
                holder: &holder,
                max_wait: opts.max_wait,
                force: opts.force,
            },
        )
        .await?;

        let lease = Arc::new(Mutex::new(record));
        let handle = renewal::start(self.store.clone(), lease.clone(), self.config.clone());
        let guard = LeaseGuard {
            resource: resource.to_string(),
            lost: handle.subscribe(),
        };

        let result = op(guard).await;

        if handle.stop().await {
            self.release(&lease).await;
        } else {
            warn!(
                "Not releasing the lease on '{}': ownership was already lost",
                resource
            );
        }
        result
    }

    /// Best-effort release. Failure is logged, never propagated: an
    /// unreleased record expires on its own and gets reclaimed, and the
    /// operation's result must not be overridden by cleanup trouble.
    async fn release(&self, lease: &Mutex<LeaseRecord>) {
        let (resource, generation) = {
            let current = lease.lock().await;
            (current.resource.clone(), current.generation)
        };
        match self.store.delete(&resource, generation).await {
            // NotFound already is the goal state: no lease held.
            Ok(DeleteOutcome::Deleted) | Ok(DeleteOutcome::NotFound) => {
                info!("Released deployment lease on '{}'", resource);
            }
            Ok(DeleteOutcome::Conflict(current)) => {
                warn!(
                    "Lease on '{}' was taken over by {} before release",
                    resource, current.holder
                );
            }
            Err(e) => {
                warn!(
                    "Failed to release the lease on '{}' ({}); it will expire on its own",
                    resource, e
                );
            }
        }
    }
}

/// Fresh holder identity per acquisition: process identity plus a random
/// component, so a restarted process never collides with its crashed self.
fn holder_id() -> String {
    let user = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
    let nonce = Uuid::new_v4().simple().to_string();
    format!("{}@{}/{}-{}", user, host, std::process::id(), &nonce[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryLeaseStore;
    use anyhow::anyhow;
    use tokio::time::sleep;

    fn manager(store: Arc<MemoryLeaseStore>) -> LeaseManager {
        let config = LeaseConfig {
            ttl_seconds: 9,
            renew_divisor: 3,
            ..Default::default()
        };
        LeaseManager::new(store, config)
    }

    #[tokio::test]
    async fn operation_runs_and_lease_is_released() {
        let store = Arc::new(MemoryLeaseStore::new());
        let result = manager(store.clone())
            .with_lease("ns-a", LeaseOptions::default(), |guard| async move {
                guard.check()?;
                Ok(42)
            })
            .await
            .unwrap();
        assert_eq!(result, 42);
        assert!(store.get("ns-a").await.is_none());
    }

    #[tokio::test]
    async fn lease_is_released_when_the_operation_fails() {
        let store = Arc::new(MemoryLeaseStore::new());
        let result: anyhow::Result<()> = manager(store.clone())
            .with_lease("ns-a", LeaseOptions::default(), |_| async {
                Err(anyhow!("deploy blew up"))
            })
            .await;
        assert!(result.is_err());
        assert!(store.get("ns-a").await.is_none());
    }

    #[tokio::test]
    async fn busy_error_names_the_current_holder() {
        let store = Arc::new(MemoryLeaseStore::new());
        store.put(LeaseRecord::new("ns-a", "ops@build-3/91", 600)).await;

        let err = manager(store.clone())
            .with_lease("ns-a", LeaseOptions::default(), |_| async { Ok(()) })
            .await
            .unwrap_err();
        match err.downcast_ref::<LeaseError>() {
            Some(LeaseError::Busy { holder, .. }) => assert_eq!(holder, "ops@build-3/91"),
            other => panic!("expected Busy, got {:?}", other),
        }
        // The operation never ran; the holder's record is untouched.
        assert_eq!(store.get("ns-a").await.unwrap().generation, 0);
    }

    #[tokio::test]
    async fn forced_acquisition_takes_over_and_still_cleans_up() {
        let store = Arc::new(MemoryLeaseStore::new());
        store.put(LeaseRecord::new("ns-a", "h1", 600)).await;

        let opts = LeaseOptions {
            max_wait: Duration::ZERO,
            force: true,
        };
        manager(store.clone())
            .with_lease("ns-a", opts, |guard| async move {
                guard.check()?;
                Ok(())
            })
            .await
            .unwrap();
        assert!(store.get("ns-a").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn guard_reports_loss_after_an_external_steal() {
        let store = Arc::new(MemoryLeaseStore::new());
        let intruder_store = store.clone();

        let err = manager(store.clone())
            .with_lease("ns-a", LeaseOptions::default(), |guard| async move {
                // A third party rewrites the record under us...
                let mut stolen = intruder_store.get("ns-a").await.unwrap();
                stolen.holder = "intruder".to_string();
                stolen.generation = 99;
                intruder_store.put(stolen).await;

                // ...the next renewal tick notices, and the guard trips.
                sleep(Duration::from_secs(4)).await;
                guard.check()?;
                Ok(())
            })
            .await
            .unwrap_err();

        match err.downcast_ref::<LeaseError>() {
            Some(LeaseError::Lost { resource }) => assert_eq!(resource, "ns-a"),
            other => panic!("expected Lost, got {:?}", other),
        }
        // No release: the intruder's record must be left alone.
        assert_eq!(store.get("ns-a").await.unwrap().holder, "intruder");
    }

    #[tokio::test]
    async fn release_of_an_already_absent_record_is_success() {
        let store = Arc::new(MemoryLeaseStore::new());
        let cleanup_store = store.clone();

        let result = manager(store.clone())
            .with_lease("ns-a", LeaseOptions::default(), |_| async move {
                // The record vanishes before we get to release it.
                cleanup_store.remove("ns-a").await;
                Ok("done")
            })
            .await
            .unwrap();
        assert_eq!(result, "done");
        assert!(store.get("ns-a").await.is_none());
    }

    #[tokio::test]
    async fn empty_resource_name_is_a_local_defect() {
        let store = Arc::new(MemoryLeaseStore::new());
        let err = manager(store)
            .with_lease("", LeaseOptions::default(), |_| async { Ok(()) })
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LeaseError>(),
            Some(LeaseError::InvalidState(_))
        ));
    }

    #[test]
    fn holder_ids_do_not_collide_across_calls() {
        assert_ne!(holder_id(), holder_id());
    }
}
