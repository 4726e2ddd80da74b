//! Room Registry: durable record of every live private room
//!
//! Maps room id to owner and reclamation deadline. Only the lifecycle
//! manager mutates the registry: creation inserts, destruction removes,
//! the sweeper refreshes deadlines through it. Every mutation persists the
//! whole document before it is acknowledged.

use crate::model::{ChannelId, Timestamp, UserId};
use crate::store::{DocumentStore, StoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A tracked private room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    /// External resource id of the room
    pub room_id: ChannelId,

    /// Member who owns the room
    pub owner_id: UserId,

    /// Absolute deadline after which an empty room is reclaimed
    pub reclaim_at: Timestamp,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct RegistryDocument {
    rooms: HashMap<ChannelId, RoomRecord>,
}

/// Durable room id -> record mapping
pub struct RoomRegistry {
    document: RegistryDocument,
    store: DocumentStore,
}

impl RoomRegistry {
    /// Open the registry, loading any existing document
    pub fn open(store: DocumentStore) -> StoreResult<Self> {
        let document = store.load()?;
        Ok(RoomRegistry { document, store })
    }

    /// Insert a newly created room
    pub fn insert(&mut self, record: RoomRecord) -> StoreResult<()> {
        let mut next = self.document.clone();
        next.rooms.insert(record.room_id.clone(), record);
        self.store.replace(&next)?;
        self.document = next;
        Ok(())
    }

    /// Remove a room record, returning it if present
    pub fn remove(&mut self, room_id: &ChannelId) -> StoreResult<Option<RoomRecord>> {
        if !self.document.rooms.contains_key(room_id) {
            return Ok(None);
        }

        let mut next = self.document.clone();
        let removed = next.rooms.remove(room_id);
        self.store.replace(&next)?;
        self.document = next;
        Ok(removed)
    }

    /// Look up a room record
    pub fn get(&self, room_id: &ChannelId) -> Option<&RoomRecord> {
        self.document.rooms.get(room_id)
    }

    /// Whether a room is tracked
    pub fn contains(&self, room_id: &ChannelId) -> bool {
        self.document.rooms.contains_key(room_id)
    }

    /// Move a room's reclamation deadline; `false` if the room is unknown
    pub fn set_reclaim_at(
        &mut self,
        room_id: &ChannelId,
        reclaim_at: Timestamp,
    ) -> StoreResult<bool> {
        if !self.document.rooms.contains_key(room_id) {
            return Ok(false);
        }

        let mut next = self.document.clone();
        if let Some(record) = next.rooms.get_mut(room_id) {
            record.reclaim_at = reclaim_at;
        }
        self.store.replace(&next)?;
        self.document = next;
        Ok(true)
    }

    /// All rooms owned by a given member
    pub fn rooms_owned_by(&self, owner: &UserId) -> Vec<RoomRecord> {
        self.document
            .rooms
            .values()
            .filter(|r| &r.owner_id == owner)
            .cloned()
            .collect()
    }

    /// Snapshot of every tracked room, for one sweep pass
    pub fn snapshot(&self) -> Vec<RoomRecord> {
        self.document.rooms.values().cloned().collect()
    }

    /// Number of tracked rooms
    pub fn len(&self) -> usize {
        self.document.rooms.len()
    }

    /// Whether the registry tracks no rooms
    pub fn is_empty(&self) -> bool {
        self.document.rooms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_registry(dir: &TempDir) -> RoomRegistry {
        let store = DocumentStore::open(dir.path().join("active_rooms.json")).unwrap();
        RoomRegistry::open(store).unwrap()
    }

    fn record(room: &str, owner: &str, deadline: u64) -> RoomRecord {
        RoomRecord {
            room_id: ChannelId::new(room),
            owner_id: UserId::new(owner),
            reclaim_at: Timestamp::from_millis(deadline),
        }
    }

    #[test]
    fn test_insert_and_get() {
        let dir = TempDir::new().unwrap();
        let mut registry = open_registry(&dir);

        registry.insert(record("room-1", "alice", 500)).unwrap();
        let found = registry.get(&ChannelId::new("room-1")).unwrap();
        assert_eq!(found.owner_id, UserId::new("alice"));
        assert_eq!(found.reclaim_at, Timestamp::from_millis(500));
    }

    #[test]
    fn test_remove_returns_record() {
        let dir = TempDir::new().unwrap();
        let mut registry = open_registry(&dir);

        registry.insert(record("room-1", "alice", 500)).unwrap();
        let removed = registry.remove(&ChannelId::new("room-1")).unwrap();
        assert_eq!(removed.unwrap().room_id, ChannelId::new("room-1"));
        assert!(registry.is_empty());

        let missing = registry.remove(&ChannelId::new("room-1")).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_set_reclaim_at() {
        let dir = TempDir::new().unwrap();
        let mut registry = open_registry(&dir);

        registry.insert(record("room-1", "alice", 500)).unwrap();
        assert!(registry
            .set_reclaim_at(&ChannelId::new("room-1"), Timestamp::from_millis(900))
            .unwrap());
        assert_eq!(
            registry.get(&ChannelId::new("room-1")).unwrap().reclaim_at,
            Timestamp::from_millis(900)
        );

        assert!(!registry
            .set_reclaim_at(&ChannelId::new("room-2"), Timestamp::from_millis(900))
            .unwrap());
    }

    #[test]
    fn test_rooms_owned_by() {
        let dir = TempDir::new().unwrap();
        let mut registry = open_registry(&dir);

        registry.insert(record("room-1", "alice", 500)).unwrap();
        registry.insert(record("room-2", "alice", 600)).unwrap();
        registry.insert(record("room-3", "bob", 700)).unwrap();

        let alice_rooms = registry.rooms_owned_by(&UserId::new("alice"));
        assert_eq!(alice_rooms.len(), 2);
        assert!(alice_rooms.iter().all(|r| r.owner_id == UserId::new("alice")));
    }

    #[test]
    fn test_one_owner_may_hold_multiple_rooms() {
        // Re-triggering the hub while a room is still active creates a
        // second room; the registry does not enforce single ownership.
        let dir = TempDir::new().unwrap();
        let mut registry = open_registry(&dir);

        registry.insert(record("room-1", "alice", 500)).unwrap();
        registry.insert(record("room-2", "alice", 600)).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let mut registry = open_registry(&dir);
            registry.insert(record("room-1", "alice", 500)).unwrap();
        }

        let registry = open_registry(&dir);
        assert!(registry.contains(&ChannelId::new("room-1")));
    }
}
