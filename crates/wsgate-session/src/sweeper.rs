//! Background eviction of expired sessions.

use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::config::MAX_SWEEP_INTERVAL;
use crate::connection::Connection;
use crate::store::SessionStore;

/// Maximum number of sessions evicted per write-lock acquisition.
///
/// A sweep that finds more expired sessions than this releases the lock
/// between batches so admissions and lookups can interleave.
pub const SWEEP_BATCH_SIZE: usize = 256;

/// Shortest interval the sweep loop will tick at.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Periodic TTL sweeper for a [`SessionStore`].
///
/// One sweeper runs as a single task, so two passes never overlap. Ticks
/// missed while a pass is running are skipped rather than queued.
pub struct Sweeper<C> {
    store: SessionStore<C>,
    interval: Duration,
}

impl<C: Connection> Sweeper<C> {
    /// Create a sweeper using the store's configured interval.
    ///
    /// The interval is clamped to between one millisecond and
    /// [`MAX_SWEEP_INTERVAL`].
    pub fn new(store: SessionStore<C>) -> Self {
        let interval = store
            .config()
            .sweep_interval
            .clamp(MIN_SWEEP_INTERVAL, MAX_SWEEP_INTERVAL);
        Self { store, interval }
    }

    /// Run one full pass: evict everything that has expired as of `now`.
    ///
    /// Returns the number of sessions evicted.
    pub async fn sweep(&self, now: Instant) -> usize {
        let mut total = 0;

        loop {
            let evicted = self.store.evict_expired(now, SWEEP_BATCH_SIZE);
            for session_id in &evicted {
                debug!(session_id = %session_id, "Evicted expired session");
            }
            total += evicted.len();

            if evicted.len() < SWEEP_BATCH_SIZE {
                break;
            }
            tokio::task::yield_now().await;
        }

        if total > 0 {
            debug!(count = total, "Sweep evicted expired sessions");
        } else {
            trace!("Sweep found no expired sessions");
        }

        total
    }

    /// Spawn the sweep loop. It runs until `cancel` fires.
    pub fn spawn(self, cancel: CancellationToken) -> SweeperHandle {
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            let now = tokio::time::Instant::now();
            let first = now.checked_add(self.interval).unwrap_or(now);
            let mut ticker = tokio::time::interval_at(first, self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            info!(interval = ?self.interval, "Session sweeper started");

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        // A pass is never interrupted by cancellation; the
                        // token is only observed between ticks.
                        self.sweep(Instant::now()).await;
                    }
                }
            }

            info!("Session sweeper stopped");
        });

        SweeperHandle { cancel, handle }
    }
}

/// Handle to a running sweeper task.
pub struct SweeperHandle {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the sweeper and wait for any in-progress pass to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "Session sweeper task ended abnormally");
        }
    }

    /// Whether the sweeper task has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
