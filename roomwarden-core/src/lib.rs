//! Ephemeral voice-room lifecycle and access control.
//!
//! A hub location acts as the entry trigger: occupants who join it get a
//! private room provisioned, with permissions derived from the owner's
//! trust list. A background sweeper reclaims rooms that sit empty past
//! their grace period, and every lifecycle event lands in the activity
//! ledger.

pub mod config;
pub mod core_ledger;
pub mod core_lifecycle;
pub mod core_policy;
pub mod core_registry;
pub mod core_sweeper;
pub mod core_trust;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod provider;
pub mod shutdown;
pub mod store;
pub mod test_utils;

pub use config::Config;
pub use core_lifecycle::{DestroyReason, LifecycleConfig, LifecycleError, RoomLifecycle};
pub use core_sweeper::{SweepReport, Sweeper};
pub use logging::{init_logging, init_logging_with_config, LogConfig, LogLevel};
pub use model::{ChannelId, Timestamp, UserId};
pub use provider::{ProviderError, ResourceProvider, RoomSnapshot};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Ensure the main exports are accessible
        let _ = LogLevel::Info;
        let _ = UserId::new("user");
    }
}
