//! Scriptable in-memory resource provider
//!
//! Stands in for the chat platform in tests: rooms are plain structs,
//! occupancy is edited directly, and failures (transient faults, vanished
//! rooms, rejected calls) are injected per room.

use crate::core_policy::PermissionRule;
use crate::model::{ChannelId, UserId};
use crate::provider::{ProviderError, ResourceProvider, RoomSnapshot};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use uuid::Uuid;

/// One simulated voice room
#[derive(Debug, Clone)]
pub struct FakeRoom {
    pub name: String,
    pub parent: ChannelId,
    pub occupants: HashSet<UserId>,
    pub rules: Vec<PermissionRule>,
    pub set_permission_calls: usize,
}

#[derive(Default)]
struct ProviderState {
    parents: HashMap<ChannelId, ChannelId>,
    rooms: HashMap<ChannelId, FakeRoom>,
    fetch_faults: HashMap<ChannelId, String>,
    delete_faults: HashMap<ChannelId, String>,
    next_set_permissions_fault: Option<String>,
    delete_calls: HashMap<ChannelId, usize>,
    disconnected: Vec<UserId>,
}

/// In-memory `ResourceProvider` implementation for tests
#[derive(Default)]
pub struct InMemoryProvider {
    state: Mutex<ProviderState>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that already knows the hub and its parent group
    pub fn with_hub(hub: &ChannelId, parent: &ChannelId) -> Self {
        let provider = Self::new();
        provider.register_parent(hub, parent);
        provider
    }

    /// Teach the provider a location's parent group
    pub fn register_parent(&self, location: &ChannelId, parent: &ChannelId) {
        self.state
            .lock()
            .unwrap()
            .parents
            .insert(location.clone(), parent.clone());
    }

    /// Put a member into a room
    pub fn occupy(&self, room: &ChannelId, member: &UserId) {
        let mut state = self.state.lock().unwrap();
        if let Some(fake) = state.rooms.get_mut(room) {
            fake.occupants.insert(member.clone());
        }
    }

    /// Empty a room out
    pub fn vacate_all(&self, room: &ChannelId) {
        let mut state = self.state.lock().unwrap();
        if let Some(fake) = state.rooms.get_mut(room) {
            fake.occupants.clear();
        }
    }

    /// Remove a room out-of-band, as staff deleting it by hand would
    pub fn vanish(&self, room: &ChannelId) {
        self.state.lock().unwrap().rooms.remove(room);
    }

    /// Make fetches of a room fail with a transient error until cleared
    pub fn inject_fetch_fault(&self, room: &ChannelId, reason: &str) {
        self.state
            .lock()
            .unwrap()
            .fetch_faults
            .insert(room.clone(), reason.to_string());
    }

    pub fn clear_fetch_fault(&self, room: &ChannelId) {
        self.state.lock().unwrap().fetch_faults.remove(room);
    }

    /// Make the next deletion of a room fail with a transient error
    pub fn fail_next_delete(&self, room: &ChannelId, reason: &str) {
        self.state
            .lock()
            .unwrap()
            .delete_faults
            .insert(room.clone(), reason.to_string());
    }

    /// Make the next `set_permissions` call fail with a transient error
    pub fn fail_next_set_permissions(&self, reason: &str) {
        self.state.lock().unwrap().next_set_permissions_fault = Some(reason.to_string());
    }

    /// Clone of a room's current state, if it exists
    pub fn room(&self, room: &ChannelId) -> Option<FakeRoom> {
        self.state.lock().unwrap().rooms.get(room).cloned()
    }

    /// Number of rooms currently alive on the platform side
    pub fn room_count(&self) -> usize {
        self.state.lock().unwrap().rooms.len()
    }

    /// How many times deletion was attempted for a room
    pub fn delete_calls(&self, room: &ChannelId) -> usize {
        self.state
            .lock()
            .unwrap()
            .delete_calls
            .get(room)
            .copied()
            .unwrap_or(0)
    }

    /// Every member forcibly disconnected so far, in order
    pub fn disconnected(&self) -> Vec<UserId> {
        self.state.lock().unwrap().disconnected.clone()
    }
}

#[async_trait]
impl ResourceProvider for InMemoryProvider {
    async fn parent_group(&self, location: &ChannelId) -> Result<ChannelId, ProviderError> {
        self.state
            .lock()
            .unwrap()
            .parents
            .get(location)
            .cloned()
            .ok_or(ProviderError::NotFound)
    }

    async fn create_room(
        &self,
        name: &str,
        parent: &ChannelId,
    ) -> Result<ChannelId, ProviderError> {
        let id = ChannelId::new(format!("room-{}", Uuid::new_v4()));
        self.state.lock().unwrap().rooms.insert(
            id.clone(),
            FakeRoom {
                name: name.to_string(),
                parent: parent.clone(),
                occupants: HashSet::new(),
                rules: Vec::new(),
                set_permission_calls: 0,
            },
        );
        Ok(id)
    }

    async fn delete_room(&self, room: &ChannelId) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        *state.delete_calls.entry(room.clone()).or_insert(0) += 1;

        if let Some(reason) = state.delete_faults.remove(room) {
            return Err(ProviderError::Transient(reason));
        }
        if state.rooms.remove(room).is_none() {
            return Err(ProviderError::NotFound);
        }
        Ok(())
    }

    async fn fetch_room(&self, room: &ChannelId) -> Result<RoomSnapshot, ProviderError> {
        let state = self.state.lock().unwrap();
        if let Some(reason) = state.fetch_faults.get(room) {
            return Err(ProviderError::Transient(reason.clone()));
        }
        state
            .rooms
            .get(room)
            .map(|fake| RoomSnapshot {
                occupants: fake.occupants.clone(),
            })
            .ok_or(ProviderError::NotFound)
    }

    async fn set_permissions(
        &self,
        room: &ChannelId,
        rules: &[PermissionRule],
    ) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        if let Some(reason) = state.next_set_permissions_fault.take() {
            return Err(ProviderError::Transient(reason));
        }
        let fake = state.rooms.get_mut(room).ok_or(ProviderError::NotFound)?;
        fake.rules = rules.to_vec();
        fake.set_permission_calls += 1;
        Ok(())
    }

    async fn move_member(
        &self,
        member: &UserId,
        room: &ChannelId,
    ) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        if !state.rooms.contains_key(room) {
            return Err(ProviderError::NotFound);
        }
        for fake in state.rooms.values_mut() {
            fake.occupants.remove(member);
        }
        if let Some(fake) = state.rooms.get_mut(room) {
            fake.occupants.insert(member.clone());
        }
        Ok(())
    }

    async fn disconnect_member(&self, member: &UserId) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        for fake in state.rooms.values_mut() {
            fake.occupants.remove(member);
        }
        state.disconnected.push(member.clone());
        Ok(())
    }
}
