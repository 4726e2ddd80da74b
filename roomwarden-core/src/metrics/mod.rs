//! Metrics for observability
//!
//! Counter names are registered up front so exporters can attach
//! descriptions. Lifecycle and sweeper call sites record through
//! `record_counter`.

use metrics::{counter, describe_counter};

/// Initialize metrics with descriptions
pub fn init_metrics() {
    describe_counter!(
        "roomwarden.rooms.created",
        "Number of rooms provisioned from the entry trigger"
    );
    describe_counter!(
        "roomwarden.rooms.destroyed",
        "Number of rooms reclaimed or cleaned up after external deletion"
    );
    describe_counter!(
        "roomwarden.members.evicted",
        "Number of occupants disconnected by permission re-application"
    );
    describe_counter!(
        "roomwarden.sweeps.completed",
        "Number of completed reclamation sweep passes"
    );
}

/// Record a counter metric
pub fn record_counter(name: &'static str, value: u64) {
    counter!(name).increment(value);
}
