//! Resource Provider: the chat-platform boundary
//!
//! Everything roomwarden needs from the platform is behind this trait:
//! creating and deleting voice rooms, reading occupancy, applying
//! permission rule sets, and moving or disconnecting members. The live
//! implementation wraps the platform connection; tests use the in-memory
//! provider from `test_utils`.

use crate::core_policy::PermissionRule;
use crate::model::{ChannelId, UserId};
use async_trait::async_trait;
use std::collections::HashSet;
use thiserror::Error;

/// Failures surfaced by the resource provider
///
/// `NotFound` is authoritative: the resource no longer exists on the
/// platform (e.g. staff deleted a room by hand). Everything else is
/// `Transient` and safe to retry on a later cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("resource not found")]
    NotFound,

    #[error("transient provider failure: {0}")]
    Transient(String),
}

/// Point-in-time view of a room's occupancy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub occupants: HashSet<UserId>,
}

impl RoomSnapshot {
    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }
}

/// External room operations consumed by the lifecycle manager and sweeper
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Resolve the parent group of a location (e.g. the hub's category)
    async fn parent_group(&self, location: &ChannelId) -> Result<ChannelId, ProviderError>;

    /// Create a new voice room under a parent group, returning its id
    async fn create_room(
        &self,
        name: &str,
        parent: &ChannelId,
    ) -> Result<ChannelId, ProviderError>;

    /// Delete a voice room
    async fn delete_room(&self, room: &ChannelId) -> Result<(), ProviderError>;

    /// Fetch a room's current occupancy
    async fn fetch_room(&self, room: &ChannelId) -> Result<RoomSnapshot, ProviderError>;

    /// Replace a room's permission rule set
    async fn set_permissions(
        &self,
        room: &ChannelId,
        rules: &[PermissionRule],
    ) -> Result<(), ProviderError>;

    /// Move a member into a room
    async fn move_member(&self, member: &UserId, room: &ChannelId)
        -> Result<(), ProviderError>;

    /// Disconnect a member from voice entirely
    async fn disconnect_member(&self, member: &UserId) -> Result<(), ProviderError>;
}
