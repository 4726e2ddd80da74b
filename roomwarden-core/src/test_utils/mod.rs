//! Test utilities and helpers for roomwarden
//!
//! Provides the scriptable in-memory resource provider and wiring helpers
//! used across unit and integration tests.

pub mod provider;

pub use provider::{FakeRoom, InMemoryProvider};

use crate::core_ledger::ActivityLedger;
use crate::core_lifecycle::{LifecycleConfig, RoomLifecycle};
use crate::core_registry::RoomRegistry;
use crate::core_trust::TrustStore;
use crate::model::ChannelId;
use crate::provider::ResourceProvider;
use crate::store::DocumentStore;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Build a lifecycle manager with stores rooted at `base`, 5 minute grace
pub fn lifecycle_at(
    base: &Path,
    provider: Arc<dyn ResourceProvider>,
    hub_location: ChannelId,
) -> RoomLifecycle {
    lifecycle_at_with_grace(base, provider, hub_location, Duration::from_secs(300))
}

/// Build a lifecycle manager with stores rooted at `base` and an explicit grace period
pub fn lifecycle_at_with_grace(
    base: &Path,
    provider: Arc<dyn ResourceProvider>,
    hub_location: ChannelId,
    grace_period: Duration,
) -> RoomLifecycle {
    let trust = TrustStore::open(
        DocumentStore::open(base.join("data.json")).expect("trust store"),
    )
    .expect("trust store");
    let registry = RoomRegistry::open(
        DocumentStore::open(base.join("active_rooms.json")).expect("registry store"),
    )
    .expect("registry");
    let ledger = ActivityLedger::new(base.join("logs"));

    RoomLifecycle::new(
        provider,
        trust,
        registry,
        ledger,
        LifecycleConfig {
            hub_location,
            grace_period,
        },
    )
}
