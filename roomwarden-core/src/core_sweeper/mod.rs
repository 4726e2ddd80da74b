//! Reclamation Sweeper
//!
//! Periodic reconciliation of the room registry against reality. Each tick
//! takes the core state lock for its whole pass, so a tick never interleaves
//! with an entry trigger or trust mutation, and ticks can never overlap each
//! other. Per-room outcomes are independent: one room failing never aborts
//! the rest of the pass.

use crate::core_lifecycle::{DestroyReason, RoomLifecycle};
use crate::metrics::record_counter;
use crate::model::Timestamp;
use crate::provider::ProviderError;
use crate::shutdown::ShutdownCoordinator;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Outcome counts for one sweep pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Rooms reclaimed because they sat empty past their deadline
    pub reclaimed: usize,
    /// Rooms whose external resource had vanished (cleaned up locally)
    pub vanished: usize,
    /// Occupied rooms whose deadline was pushed forward
    pub refreshed: usize,
    /// Empty rooms still inside their grace period
    pub counting_down: usize,
    /// Rooms skipped this tick due to transient provider failures
    pub skipped: usize,
}

/// Periodic reconciliation task over the room registry
pub struct Sweeper {
    lifecycle: Arc<RoomLifecycle>,
    interval: Duration,
}

impl Sweeper {
    pub fn new(lifecycle: Arc<RoomLifecycle>, interval: Duration) -> Self {
        Sweeper {
            lifecycle,
            interval,
        }
    }

    /// Run one reconciliation pass over every tracked room
    ///
    /// `now` is taken as a parameter so deadline decisions are exact and
    /// testable; the run loop passes the wall clock.
    pub async fn sweep_once(&self, now: Timestamp) -> SweepReport {
        let mut report = SweepReport::default();
        let mut state = self.lifecycle.lock().await;
        let provider = Arc::clone(self.lifecycle.provider());
        let grace = self.lifecycle.grace_period();

        for record in state.registry.snapshot() {
            match provider.fetch_room(&record.room_id).await {
                Err(ProviderError::NotFound) => {
                    // Out-of-band deletion: the resource is already gone,
                    // so only the local record is cleaned up.
                    info!(room = %record.room_id, "room deleted externally, dropping record");
                    self.lifecycle
                        .destroy_room_locked(&mut state, &record, DestroyReason::ExternallyDeleted)
                        .await;
                    report.vanished += 1;
                }
                Err(ProviderError::Transient(reason)) => {
                    warn!(room = %record.room_id, %reason,
                        "transient failure fetching room, retrying next tick");
                    report.skipped += 1;
                }
                Ok(snapshot) if snapshot.is_empty() => {
                    if now >= record.reclaim_at {
                        self.lifecycle
                            .destroy_room_locked(&mut state, &record, DestroyReason::Timeout)
                            .await;
                        report.reclaimed += 1;
                    } else {
                        report.counting_down += 1;
                    }
                }
                Ok(_) => {
                    // Presence alone refreshes the sliding window.
                    match state
                        .registry
                        .set_reclaim_at(&record.room_id, now.plus(grace))
                    {
                        Ok(_) => report.refreshed += 1,
                        Err(e) => {
                            error!(room = %record.room_id, error = %e,
                                "failed to persist refreshed deadline");
                            report.skipped += 1;
                        }
                    }
                }
            }
        }

        record_counter("roomwarden.sweeps.completed", 1);
        report
    }

    /// Drive sweep ticks at the configured cadence until shutdown
    ///
    /// Ticks run sequentially on this task; a tick that outlasts the
    /// interval delays the next one rather than running concurrently.
    pub async fn run(&self, shutdown: Arc<ShutdownCoordinator>) {
        let mut ticks = tokio::time::interval(self.interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shutdown_rx = shutdown.subscribe();

        info!(interval = ?self.interval, "reclamation sweeper started");
        loop {
            tokio::select! {
                _ = ticks.tick() => {
                    let report = self.sweep_once(Timestamp::now()).await;
                    debug!(?report, "sweep tick complete");
                }
                _ = shutdown_rx.recv() => {
                    info!("reclamation sweeper stopping");
                    break;
                }
            }
        }
    }
}
