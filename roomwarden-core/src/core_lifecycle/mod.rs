//! Room Lifecycle Manager
//!
//! Orchestrates every transition a private room goes through:
//! Provisioning -> Active (looping on occupancy changes) -> PendingReclaim
//! -> Destroyed. Owns all mutable core state (trust store, room registry,
//! ledger) behind a single async lock, so entry triggers, trust mutations
//! and sweep ticks are atomic with respect to one another. Creation is the
//! only way a record enters the registry and `destroy_room_locked` the
//! only way one leaves it.

use crate::core_ledger::{ActivityLedger, RoomSummary};
use crate::core_policy::derive_plan;
use crate::core_registry::{RoomRecord, RoomRegistry};
use crate::core_trust::TrustStore;
use crate::metrics::record_counter;
use crate::model::{ChannelId, Timestamp, UserId};
use crate::provider::{ProviderError, ResourceProvider};
use crate::store::StoreError;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{error, info, warn};

/// Lifecycle operation errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// A required external location is missing or misconfigured
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("resource provider error: {0}")]
    Provider(#[from] ProviderError),

    /// A durable write failed; the operation was not applied
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),
}

/// Why a room was destroyed; determines the terminal ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyReason {
    /// Sat empty past its reclamation deadline
    Timeout,
    /// The external resource vanished behind our back
    ExternallyDeleted,
}

impl DestroyReason {
    pub fn ledger_message(&self) -> &'static str {
        match self {
            DestroyReason::Timeout => "Channel Deleted - Timeout",
            DestroyReason::ExternallyDeleted => "Channel Deleted - Staff",
        }
    }
}

/// Lifecycle manager configuration
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// The shared hub location whose occupancy triggers room creation
    pub hub_location: ChannelId,

    /// How long a room may sit empty before reclamation
    pub grace_period: Duration,
}

/// All mutable core state, guarded by one lock
pub struct CoreState {
    pub trust: TrustStore,
    pub registry: RoomRegistry,
    pub ledger: ActivityLedger,
}

/// The lifecycle manager
pub struct RoomLifecycle {
    state: Arc<Mutex<CoreState>>,
    provider: Arc<dyn ResourceProvider>,
    config: LifecycleConfig,
}

impl RoomLifecycle {
    pub fn new(
        provider: Arc<dyn ResourceProvider>,
        trust: TrustStore,
        registry: RoomRegistry,
        ledger: ActivityLedger,
        config: LifecycleConfig,
    ) -> Self {
        RoomLifecycle {
            state: Arc::new(Mutex::new(CoreState {
                trust,
                registry,
                ledger,
            })),
            provider,
            config,
        }
    }

    pub fn grace_period(&self) -> Duration {
        self.config.grace_period
    }

    pub(crate) fn provider(&self) -> &Arc<dyn ResourceProvider> {
        &self.provider
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, CoreState> {
        self.state.lock().await
    }

    /// Handle a member entering the hub: provision a private room they own
    ///
    /// All-or-nothing: any provider failure during allocation aborts the
    /// transition with no registry record persisted (a half-configured
    /// room is deleted best-effort). Moving the member in happens after
    /// the record is durable; a failed move leaves an empty room for the
    /// sweeper to reclaim.
    pub async fn on_entry_trigger(
        &self,
        owner: &UserId,
        display_name: &str,
    ) -> Result<RoomRecord, LifecycleError> {
        let mut state = self.state.lock().await;

        let parent = match self.provider.parent_group(&self.config.hub_location).await {
            Ok(parent) => parent,
            Err(ProviderError::NotFound) => {
                return Err(LifecycleError::Configuration(format!(
                    "hub location {} not found",
                    self.config.hub_location
                )))
            }
            Err(e) => return Err(e.into()),
        };

        let name = format!("{}'s Private Call", display_name);
        let room_id = self.provider.create_room(&name, &parent).await?;

        let trusted = state.trust.trusted_of(owner);
        let plan = derive_plan(owner, &trusted, &HashSet::new());
        if let Err(e) = self.provider.set_permissions(&room_id, &plan.rules).await {
            self.abandon_room(&room_id).await;
            return Err(e.into());
        }

        let record = RoomRecord {
            room_id: room_id.clone(),
            owner_id: owner.clone(),
            reclaim_at: Timestamp::now().plus(self.config.grace_period),
        };
        if let Err(e) = state.registry.insert(record.clone()) {
            self.abandon_room(&room_id).await;
            return Err(e.into());
        }

        state
            .ledger
            .record(&room_id, owner, &name, "Channel Created")
            .await;

        if let Err(e) = self.provider.move_member(owner, &room_id).await {
            warn!(room = %room_id, owner = %owner, error = %e,
                "failed to move owner into new room");
        }

        record_counter("roomwarden.rooms.created", 1);
        info!(room = %room_id, owner = %owner, "private room created");
        Ok(record)
    }

    /// Reapply permissions to every room an owner holds
    ///
    /// Called after any change to the owner's trust set. Occupants in the
    /// recomputed eviction set are forcibly disconnected; this is the only
    /// path that removes members short of full-room destruction. Per-room
    /// failures are logged and do not abort the remaining rooms.
    pub async fn on_trust_changed(&self, owner: &UserId) {
        let mut state = self.state.lock().await;
        self.reapply_owner_rooms(&mut state, owner).await;
    }

    /// Add a trusted member and reapply the owner's room permissions
    ///
    /// Returns `false` if the member was already trusted (nothing to do).
    pub async fn add_trusted(
        &self,
        owner: &UserId,
        member: &UserId,
    ) -> Result<bool, LifecycleError> {
        let mut state = self.state.lock().await;
        let added = state.trust.add_trusted(owner, member)?;
        if added {
            self.reapply_owner_rooms(&mut state, owner).await;
        }
        Ok(added)
    }

    /// Remove a trusted member and reapply the owner's room permissions
    ///
    /// If the member currently occupies one of the owner's rooms they land
    /// in the eviction set and are disconnected.
    pub async fn remove_trusted(
        &self,
        owner: &UserId,
        member: &UserId,
    ) -> Result<bool, LifecycleError> {
        let mut state = self.state.lock().await;
        let removed = state.trust.remove_trusted(owner, member)?;
        if removed {
            self.reapply_owner_rooms(&mut state, owner).await;
        }
        Ok(removed)
    }

    /// Add a member to the global blacklist
    ///
    /// The blacklist does not feed permission derivation, so no rooms are
    /// touched.
    pub async fn add_blacklist(&self, member: &UserId) -> Result<bool, LifecycleError> {
        let mut state = self.state.lock().await;
        Ok(state.trust.add_blacklist(member)?)
    }

    /// Remove a member from the global blacklist
    pub async fn remove_blacklist(&self, member: &UserId) -> Result<bool, LifecycleError> {
        let mut state = self.state.lock().await;
        Ok(state.trust.remove_blacklist(member)?)
    }

    /// Destroy a room: the single authoritative removal path
    ///
    /// Optionally deletes the external resource (a deletion failure is
    /// logged and cleanup proceeds, since the resource may already be gone),
    /// removes the registry record, writes the terminal ledger entry and
    /// drops the room summary. If persisting the registry removal fails
    /// the record stays put and the next sweep retries.
    pub(crate) async fn destroy_room_locked(
        &self,
        state: &mut CoreState,
        record: &RoomRecord,
        reason: DestroyReason,
    ) {
        if reason != DestroyReason::ExternallyDeleted {
            if let Err(e) = self.provider.delete_room(&record.room_id).await {
                warn!(room = %record.room_id, error = %e,
                    "failed to delete room resource, cleaning up local record anyway");
            }
        }

        match state.registry.remove(&record.room_id) {
            Ok(_) => {}
            Err(e) => {
                error!(room = %record.room_id, error = %e,
                    "failed to persist registry removal, will retry next sweep");
                return;
            }
        }

        let name = state
            .ledger
            .summary(&record.room_id)
            .map(|s| s.room_name.clone())
            .unwrap_or_else(|| "Deleted Channel".to_string());
        state
            .ledger
            .record(
                &record.room_id,
                &record.owner_id,
                &name,
                reason.ledger_message(),
            )
            .await;
        state.ledger.discard(&record.room_id);

        record_counter("roomwarden.rooms.destroyed", 1);
        info!(room = %record.room_id, owner = %record.owner_id, ?reason, "room destroyed");
    }

    async fn reapply_owner_rooms(&self, state: &mut CoreState, owner: &UserId) {
        let trusted = state.trust.trusted_of(owner);
        for record in state.registry.rooms_owned_by(owner) {
            let snapshot = match self.provider.fetch_room(&record.room_id).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!(room = %record.room_id, error = %e,
                        "skipping permission reapply, room unreachable");
                    continue;
                }
            };

            let plan = derive_plan(owner, &trusted, &snapshot.occupants);
            if let Err(e) = self
                .provider
                .set_permissions(&record.room_id, &plan.rules)
                .await
            {
                warn!(room = %record.room_id, error = %e, "failed to reapply permissions");
                continue;
            }

            for member in &plan.evictions {
                if let Err(e) = self.provider.disconnect_member(member).await {
                    warn!(room = %record.room_id, member = %member, error = %e,
                        "failed to disconnect evicted member");
                } else {
                    record_counter("roomwarden.members.evicted", 1);
                }
            }
        }
    }

    /// Best-effort removal of a room that failed mid-provisioning
    async fn abandon_room(&self, room_id: &ChannelId) {
        if let Err(e) = self.provider.delete_room(room_id).await {
            warn!(room = %room_id, error = %e, "failed to remove half-provisioned room");
        }
    }

    // --- inspection helpers (command surface, tests) ---

    /// Snapshot of every tracked room
    pub async fn rooms(&self) -> Vec<RoomRecord> {
        self.state.lock().await.registry.snapshot()
    }

    /// Sorted trusted list for an owner
    pub async fn trusted(&self, owner: &UserId) -> Vec<UserId> {
        let state = self.state.lock().await;
        let mut members: Vec<UserId> = state.trust.list_trusted(owner).cloned().collect();
        members.sort();
        members
    }

    /// Sorted global blacklist
    pub async fn blacklist(&self) -> Vec<UserId> {
        let state = self.state.lock().await;
        let mut members: Vec<UserId> = state.trust.list_blacklist().cloned().collect();
        members.sort();
        members
    }

    /// Clone of a room's current summary, if any
    pub async fn summary(&self, room_id: &ChannelId) -> Option<RoomSummary> {
        self.state.lock().await.ledger.summary(room_id).cloned()
    }
}
