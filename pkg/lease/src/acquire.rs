use std::future::Future;
use std::time::Duration;

use pkg_types::lease::LeaseRecord;
use tokio::time::{Instant, sleep};
use tracing::{info, warn};

use crate::config::LeaseConfig;
use crate::error::LeaseError;
use crate::store::{CreateOutcome, LeaseStore, StoreUnavailable, UpdateOutcome};

/// One acquisition attempt on behalf of `holder`.
pub(crate) struct AcquireRequest<'a> {
    pub resource: &'a str,
    pub holder: &'a str,
    /// How long to keep polling a busy lease before giving up. Zero fails fast.
    pub max_wait: Duration,
    /// Take over even from a live holder.
    pub force: bool,
}

/// Run the acquisition algorithm until the lease is held, the wait window
/// closes, or the store stops answering.
///
/// Generation comparison decides conflicts; wall-clock expiry only decides
/// whether a takeover is permitted. A takeover CAS that loses its race
/// re-observes the record and decides again.
pub(crate) async fn acquire(
    store: &dyn LeaseStore,
    config: &LeaseConfig,
    req: AcquireRequest<'_>,
) -> Result<LeaseRecord, LeaseError> {
    let deadline = Instant::now() + req.max_wait;
    let mut backoff = config.backoff_base;

    loop {
        let fresh = LeaseRecord::new(req.resource, req.holder, config.ttl_seconds);
        let created = retrying(config, || store.create_if_absent(&fresh)).await?;
        let current = match created {
            CreateOutcome::Created => {
                info!(
                    "Acquired deployment lease on '{}' as {} (generation 0)",
                    req.resource, req.holder
                );
                return Ok(fresh);
            }
            CreateOutcome::AlreadyExists(current) => current,
        };

        if req.force || current.is_expired() {
            if req.force && !current.is_expired() {
                warn!(
                    "FORCED takeover of the lease on '{}': {} still holds it for another {}s and may be alive",
                    req.resource,
                    current.holder,
                    current.remaining_secs()
                );
            } else {
                info!(
                    "Lease on '{}' expired (was held by {}), taking over",
                    req.resource, current.holder
                );
            }

            let next = current.takeover(req.holder, config.ttl_seconds);
            let swapped =
                retrying(config, || store.compare_and_swap(current.generation, &next)).await?;
            match swapped {
                UpdateOutcome::Updated => {
                    info!(
                        "Acquired deployment lease on '{}' as {} (generation {})",
                        req.resource, req.holder, next.generation
                    );
                    return Ok(next);
                }
                // Another party moved the record first; re-observe and
                // decide again with the fresh state.
                UpdateOutcome::Conflict(_) | UpdateOutcome::NotFound => {}
            }
        } else if req.max_wait.is_zero() || Instant::now() >= deadline {
            let remaining_secs = current.remaining_secs();
            return Err(LeaseError::Busy {
                resource: req.resource.to_string(),
                holder: current.holder,
                remaining_secs,
            });
        }

        let pause = if req.max_wait.is_zero() {
            backoff
        } else {
            backoff.min(deadline.saturating_duration_since(Instant::now()))
        };
        sleep(pause).await;
        backoff = config.next_backoff(backoff);
    }
}

/// Retry a transient store failure a fixed number of times before surfacing
/// it; the caller must not proceed without a confirmed answer.
async fn retrying<T, F, Fut>(config: &LeaseConfig, mut op: F) -> Result<T, LeaseError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreUnavailable>>,
{
    let mut delay = config.backoff_base;
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(outcome) => return Ok(outcome),
            Err(e) if attempt < config.store_retry_attempts => {
                warn!(
                    "Lease store error (attempt {}/{}): {}",
                    attempt, config.store_retry_attempts, e
                );
                sleep(delay).await;
                delay = config.next_backoff(delay);
                attempt += 1;
            }
            Err(e) => return Err(LeaseError::BackendUnavailable(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryLeaseStore;
    use chrono::Utc;

    fn config() -> LeaseConfig {
        LeaseConfig {
            ttl_seconds: 10,
            ..Default::default()
        }
    }

    fn request<'a>(resource: &'a str, holder: &'a str) -> AcquireRequest<'a> {
        AcquireRequest {
            resource,
            holder,
            max_wait: Duration::ZERO,
            force: false,
        }
    }

    fn expired(resource: &str, holder: &str) -> LeaseRecord {
        let mut lease = LeaseRecord::new(resource, holder, 10);
        lease.expires_at = Utc::now() - chrono::Duration::seconds(1);
        lease
    }

    #[tokio::test]
    async fn empty_store_acquires_at_generation_zero() {
        let store = MemoryLeaseStore::new();
        let lease = acquire(&store, &config(), request("ns-a", "h1"))
            .await
            .unwrap();
        assert_eq!(lease.generation, 0);
        assert_eq!(lease.holder, "h1");
        assert_eq!(store.get("ns-a").await.unwrap().holder, "h1");
    }

    #[tokio::test]
    async fn held_lease_fails_fast_with_holder_identity() {
        let store = MemoryLeaseStore::new();
        store.put(LeaseRecord::new("ns-a", "h1", 10)).await;

        let err = acquire(&store, &config(), request("ns-a", "h2"))
            .await
            .unwrap_err();
        match err {
            LeaseError::Busy {
                holder,
                remaining_secs,
                ..
            } => {
                assert_eq!(holder, "h1");
                assert!(remaining_secs > 0);
            }
            other => panic!("expected Busy, got {:?}", other),
        }
        // The holder is untouched.
        assert_eq!(store.get("ns-a").await.unwrap().holder, "h1");
    }

    #[tokio::test]
    async fn expired_lease_is_stolen_with_single_generation_bump() {
        let store = MemoryLeaseStore::new();
        store.put(expired("ns-a", "h1")).await;

        let lease = acquire(&store, &config(), request("ns-a", "h2"))
            .await
            .unwrap();
        assert_eq!(lease.generation, 1);
        assert_eq!(lease.holder, "h2");
        assert!(!lease.is_expired());
    }

    // The acquisition walk-through: h1 acquires, h2 bounces off the live
    // lease, then steals it once it has lapsed.
    #[tokio::test]
    async fn contended_namespace_walkthrough() {
        let store = MemoryLeaseStore::new();
        let cfg = config();

        let first = acquire(&store, &cfg, request("ns-a", "h1")).await.unwrap();
        assert_eq!(first.generation, 0);

        assert!(matches!(
            acquire(&store, &cfg, request("ns-a", "h2")).await,
            Err(LeaseError::Busy { .. })
        ));

        // h1 goes away without releasing; its hold lapses.
        let mut lapsed = store.get("ns-a").await.unwrap();
        lapsed.expires_at = Utc::now() - chrono::Duration::seconds(1);
        store.put(lapsed).await;

        let second = acquire(&store, &cfg, request("ns-a", "h2")).await.unwrap();
        assert_eq!(second.generation, 1);
        assert_eq!(second.holder, "h2");
    }

    #[tokio::test]
    async fn force_steals_a_live_lease() {
        let store = MemoryLeaseStore::new();
        store.put(LeaseRecord::new("ns-a", "h1", 600)).await;

        let lease = acquire(
            &store,
            &config(),
            AcquireRequest {
                resource: "ns-a",
                holder: "h2",
                max_wait: Duration::ZERO,
                force: true,
            },
        )
        .await
        .unwrap();
        assert_eq!(lease.holder, "h2");
        assert_eq!(lease.generation, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn waiting_acquire_gives_up_at_the_deadline() {
        let store = MemoryLeaseStore::new();
        store.put(LeaseRecord::new("ns-a", "h1", 600)).await;

        let err = acquire(
            &store,
            &config(),
            AcquireRequest {
                resource: "ns-a",
                holder: "h2",
                max_wait: Duration::from_secs(3),
                force: false,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, LeaseError::Busy { .. }));
    }

    #[tokio::test]
    async fn waiting_acquire_wins_once_the_lease_frees() {
        let store = std::sync::Arc::new(MemoryLeaseStore::new());
        store.put(LeaseRecord::new("ns-a", "h1", 600)).await;

        let releaser = store.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            releaser.remove("ns-a").await;
        });

        let cfg = LeaseConfig {
            ttl_seconds: 10,
            backoff_base: Duration::from_millis(10),
            ..Default::default()
        };
        let lease = acquire(
            store.as_ref(),
            &cfg,
            AcquireRequest {
                resource: "ns-a",
                holder: "h2",
                max_wait: Duration::from_secs(5),
                force: false,
            },
        )
        .await
        .unwrap();
        assert_eq!(lease.holder, "h2");
        assert_eq!(lease.generation, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn store_outage_surfaces_after_bounded_retries() {
        let store = MemoryLeaseStore::new();
        store.set_unavailable(true);

        let err = acquire(&store, &config(), request("ns-a", "h1"))
            .await
            .unwrap_err();
        assert!(matches!(err, LeaseError::BackendUnavailable(_)));
    }

    #[tokio::test]
    async fn transient_outage_is_retried_through() {
        let store = MemoryLeaseStore::new();
        store.set_unavailable(true);

        // Recover the store before the retries run out.
        let recover = async {
            sleep(Duration::from_millis(50)).await;
        };
        let cfg = LeaseConfig {
            ttl_seconds: 10,
            backoff_base: Duration::from_millis(100),
            ..Default::default()
        };
        let (_, lease) = tokio::join!(
            async {
                recover.await;
                store.set_unavailable(false);
            },
            acquire(&store, &cfg, request("ns-a", "h1"))
        );
        assert_eq!(lease.unwrap().holder, "h1");
    }
}
