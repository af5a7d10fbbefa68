use std::sync::Arc;
use std::time::Duration;

use pkg_types::lease::LeaseRecord;
use tokio::sync::{Mutex, Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info, warn};

use crate::config::LeaseConfig;
use crate::store::{LeaseStore, UpdateOutcome};

/// Handle to the background task keeping one held lease alive.
///
/// A single task renews on a fixed interval, so renewal attempts for a lease
/// are strictly serialized. Loss of ownership is published at most once on a
/// watch channel, after which the task exits; a lost lease is never renewed
/// again.
pub(crate) struct RenewalHandle {
    task: JoinHandle<()>,
    shutdown: Arc<Notify>,
    lost_rx: watch::Receiver<bool>,
    stop_grace: Duration,
}

impl RenewalHandle {
    /// Observe loss of ownership; the channel flips to `true` at most once.
    pub(crate) fn subscribe(&self) -> watch::Receiver<bool> {
        self.lost_rx.clone()
    }

    /// Stop renewing. Waits up to the grace period for the task to finish an
    /// in-flight store call, then abandons it rather than block. Returns
    /// whether the lease was still owned when renewal ended; stopping after
    /// loss only suppresses any further delivery.
    pub(crate) async fn stop(self) -> bool {
        self.shutdown.notify_one();
        let mut task = self.task;
        if timeout(self.stop_grace, &mut task).await.is_err() {
            warn!("Renewal task did not stop within the grace period, abandoning it");
            task.abort();
        }
        !*self.lost_rx.borrow()
    }
}

/// Start renewing `lease` in the background.
///
/// Must only be called after acquisition has returned successfully; the
/// shared record is updated in place on every renewal.
pub(crate) fn start(
    store: Arc<dyn LeaseStore>,
    lease: Arc<Mutex<LeaseRecord>>,
    config: LeaseConfig,
) -> RenewalHandle {
    let (lost_tx, lost_rx) = watch::channel(false);
    let shutdown = Arc::new(Notify::new());
    let stop_grace = config.stop_grace;
    let task = tokio::spawn(renew_loop(
        store,
        lease,
        config,
        lost_tx,
        shutdown.clone(),
    ));
    RenewalHandle {
        task,
        shutdown,
        lost_rx,
        stop_grace,
    }
}

async fn renew_loop(
    store: Arc<dyn LeaseStore>,
    lease: Arc<Mutex<LeaseRecord>>,
    config: LeaseConfig,
    lost_tx: watch::Sender<bool>,
    shutdown: Arc<Notify>,
) {
    let resource = lease.lock().await.resource.clone();
    let interval = config.renew_interval();
    let ttl = Duration::from_secs(config.ttl_seconds);
    // The hold is good for a full TTL from the moment acquisition succeeded.
    let mut valid_until = Instant::now() + ttl;

    debug!(
        "Renewal started for '{}' (interval {}s, ttl {}s)",
        resource,
        interval.as_secs(),
        ttl.as_secs()
    );

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                debug!("Renewal stopped for '{}'", resource);
                return;
            }
            _ = sleep(interval) => {}
        }

        match renew_once(store.as_ref(), &lease, &config, valid_until).await {
            Ok(renewed_at) => valid_until = renewed_at + ttl,
            Err(reason) => {
                warn!("Lost the deployment lease on '{}': {}", resource, reason);
                let _ = lost_tx.send(true);
                return;
            }
        }
    }
}

/// One renewal tick: a single generation-checked swap. Transient store
/// failures are retried only while the hold is still provably valid;
/// holding on past expiry would break exclusivity.
async fn renew_once(
    store: &dyn LeaseStore,
    lease: &Mutex<LeaseRecord>,
    config: &LeaseConfig,
    valid_until: Instant,
) -> Result<Instant, String> {
    let mut backoff = config.backoff_base;

    loop {
        let (expected, next) = {
            let current = lease.lock().await;
            (current.generation, current.renewed())
        };

        let swapped = store.compare_and_swap(expected, &next).await;
        match swapped {
            Ok(UpdateOutcome::Updated) => {
                let renewed_at = Instant::now();
                let mut current = lease.lock().await;
                debug!(
                    "Renewed lease on '{}' (generation {} -> {})",
                    current.resource, current.generation, next.generation
                );
                *current = next;
                return Ok(renewed_at);
            }
            Ok(UpdateOutcome::Conflict(current)) => {
                return Err(format!(
                    "taken over by {} at generation {}",
                    current.holder, current.generation
                ));
            }
            Ok(UpdateOutcome::NotFound) => {
                return Err("the lease record was deleted from the store".to_string());
            }
            Err(e) => {
                if Instant::now() + backoff >= valid_until {
                    return Err(format!("store unreachable until expiry: {}", e));
                }
                info!("Renewal hit a transient store error, retrying: {}", e);
                sleep(backoff).await;
                backoff = config.next_backoff(backoff);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryLeaseStore;

    fn config() -> LeaseConfig {
        LeaseConfig {
            ttl_seconds: 9,
            renew_divisor: 3,
            ..Default::default()
        }
    }

    async fn held_lease(
        store: &MemoryLeaseStore,
        resource: &str,
        holder: &str,
    ) -> Arc<Mutex<LeaseRecord>> {
        let record = LeaseRecord::new(resource, holder, config().ttl_seconds);
        store.put(record.clone()).await;
        Arc::new(Mutex::new(record))
    }

    #[tokio::test(start_paused = true)]
    async fn renewal_bumps_generation_every_interval() {
        let store = Arc::new(MemoryLeaseStore::new());
        let lease = held_lease(&store, "ns-a", "h1").await;

        let handle = start(store.clone(), lease.clone(), config());
        // Interval is 3s; two ticks land inside 7s.
        sleep(Duration::from_secs(7)).await;

        let stored = store.get("ns-a").await.unwrap();
        assert_eq!(stored.generation, 2);
        assert_eq!(stored.holder, "h1");
        assert!(!stored.is_expired());
        assert_eq!(lease.lock().await.generation, 2);

        assert!(handle.stop().await, "lease should still be owned");
    }

    #[tokio::test(start_paused = true)]
    async fn external_takeover_is_loss_not_retry() {
        let store = Arc::new(MemoryLeaseStore::new());
        let lease = held_lease(&store, "ns-a", "h1").await;

        // A third party forces the record to a newer generation.
        let mut stolen = store.get("ns-a").await.unwrap();
        stolen.holder = "intruder".to_string();
        stolen.generation = 5;
        store.put(stolen).await;

        let handle = start(store.clone(), lease.clone(), config());
        let mut lost = handle.subscribe();
        lost.wait_for(|l| *l).await.unwrap();

        // The intruder's record is left alone afterwards.
        sleep(Duration::from_secs(30)).await;
        let stored = store.get("ns-a").await.unwrap();
        assert_eq!(stored.holder, "intruder");
        assert_eq!(stored.generation, 5);

        assert!(!handle.stop().await, "ownership was lost");
    }

    #[tokio::test(start_paused = true)]
    async fn vanished_record_is_loss() {
        let store = Arc::new(MemoryLeaseStore::new());
        let lease = held_lease(&store, "ns-a", "h1").await;
        store.remove("ns-a").await;

        let handle = start(store.clone(), lease, config());
        let mut lost = handle.subscribe();
        lost.wait_for(|l| *l).await.unwrap();
        assert!(!handle.stop().await);
    }

    #[tokio::test(start_paused = true)]
    async fn outage_through_the_deadline_is_conservative_loss() {
        let store = Arc::new(MemoryLeaseStore::new());
        let lease = held_lease(&store, "ns-a", "h1").await;
        store.set_unavailable(true);

        let handle = start(store.clone(), lease, config());
        let mut lost = handle.subscribe();
        lost.wait_for(|l| *l).await.unwrap();
        assert!(!handle.stop().await);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_before_first_tick_keeps_ownership() {
        let store = Arc::new(MemoryLeaseStore::new());
        let lease = held_lease(&store, "ns-a", "h1").await;

        let handle = start(store.clone(), lease, config());
        assert!(handle.stop().await);
        // No renewal happened; the record is untouched.
        assert_eq!(store.get("ns-a").await.unwrap().generation, 0);
    }
}
