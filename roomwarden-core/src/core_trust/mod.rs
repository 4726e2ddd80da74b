//! Trust Store: per-owner trusted member sets plus the global blacklist
//!
//! Both live in one durable document. Every mutation persists the whole
//! document before it is acknowledged (write-then-acknowledge), so a crash
//! immediately after a successful call never loses that mutation. Mutations
//! that change nothing return `false` instead of an error.

use crate::model::UserId;
use crate::store::{DocumentStore, StoreResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Durable document backing the trust store
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TrustDocument {
    /// Owner id -> set of trusted member ids
    pub trusted_users: HashMap<UserId, HashSet<UserId>>,

    /// Global blacklist, not associated with any owner
    pub blacklist: HashSet<UserId>,
}

/// Durable mapping of owners to trusted members, plus the global blacklist
pub struct TrustStore {
    document: TrustDocument,
    store: DocumentStore,
}

impl TrustStore {
    /// Open the trust store, loading any existing document
    pub fn open(store: DocumentStore) -> StoreResult<Self> {
        let document = store.load()?;
        Ok(TrustStore { document, store })
    }

    /// Add a member to an owner's trusted set
    ///
    /// Returns `false` (no-op) if the member is already trusted. The change
    /// is durable before `Ok(true)` is returned; on a persistence failure
    /// the in-memory state is left unchanged.
    pub fn add_trusted(&mut self, owner: &UserId, member: &UserId) -> StoreResult<bool> {
        if self
            .document
            .trusted_users
            .get(owner)
            .is_some_and(|set| set.contains(member))
        {
            return Ok(false);
        }

        let mut next = self.document.clone();
        next.trusted_users
            .entry(owner.clone())
            .or_default()
            .insert(member.clone());
        self.store.replace(&next)?;
        self.document = next;
        Ok(true)
    }

    /// Remove a member from an owner's trusted set
    ///
    /// Returns `false` (no-op) if the member was not trusted.
    pub fn remove_trusted(&mut self, owner: &UserId, member: &UserId) -> StoreResult<bool> {
        if !self
            .document
            .trusted_users
            .get(owner)
            .is_some_and(|set| set.contains(member))
        {
            return Ok(false);
        }

        let mut next = self.document.clone();
        if let Some(set) = next.trusted_users.get_mut(owner) {
            set.remove(member);
            if set.is_empty() {
                next.trusted_users.remove(owner);
            }
        }
        self.store.replace(&next)?;
        self.document = next;
        Ok(true)
    }

    /// Iterate an owner's trusted members (empty if the owner has none)
    pub fn list_trusted<'a>(&'a self, owner: &UserId) -> impl Iterator<Item = &'a UserId> + 'a {
        self.document
            .trusted_users
            .get(owner)
            .into_iter()
            .flatten()
    }

    /// Owned snapshot of an owner's trusted set, for permission derivation
    pub fn trusted_of(&self, owner: &UserId) -> HashSet<UserId> {
        self.document
            .trusted_users
            .get(owner)
            .cloned()
            .unwrap_or_default()
    }

    /// Add a member to the global blacklist; `false` if already present
    pub fn add_blacklist(&mut self, member: &UserId) -> StoreResult<bool> {
        if self.document.blacklist.contains(member) {
            return Ok(false);
        }

        let mut next = self.document.clone();
        next.blacklist.insert(member.clone());
        self.store.replace(&next)?;
        self.document = next;
        Ok(true)
    }

    /// Remove a member from the global blacklist; `false` if absent
    pub fn remove_blacklist(&mut self, member: &UserId) -> StoreResult<bool> {
        if !self.document.blacklist.contains(member) {
            return Ok(false);
        }

        let mut next = self.document.clone();
        next.blacklist.remove(member);
        self.store.replace(&next)?;
        self.document = next;
        Ok(true)
    }

    /// Iterate the global blacklist
    pub fn list_blacklist(&self) -> impl Iterator<Item = &UserId> {
        self.document.blacklist.iter()
    }

    /// Whether a member is blacklisted
    ///
    /// Note: the blacklist is currently not consulted by permission
    /// derivation; room access is governed solely by trust sets.
    pub fn is_blacklisted(&self, member: &UserId) -> bool {
        self.document.blacklist.contains(member)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> TrustStore {
        let store = DocumentStore::open(dir.path().join("data.json")).unwrap();
        TrustStore::open(store).unwrap()
    }

    #[test]
    fn test_add_trusted_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut trust = open_store(&dir);
        let owner = UserId::new("alice");
        let member = UserId::new("bob");

        assert!(trust.add_trusted(&owner, &member).unwrap());
        assert!(!trust.add_trusted(&owner, &member).unwrap());
        assert_eq!(trust.list_trusted(&owner).count(), 1);
    }

    #[test]
    fn test_add_then_remove_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut trust = open_store(&dir);
        let owner = UserId::new("alice");
        let member = UserId::new("bob");

        trust.add_trusted(&owner, &member).unwrap();
        assert!(trust.remove_trusted(&owner, &member).unwrap());
        assert!(trust.list_trusted(&owner).all(|m| m != &member));
    }

    #[test]
    fn test_remove_absent_member_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut trust = open_store(&dir);
        let owner = UserId::new("alice");

        assert!(!trust
            .remove_trusted(&owner, &UserId::new("bob"))
            .unwrap());
    }

    #[test]
    fn test_same_member_under_multiple_owners() {
        let dir = TempDir::new().unwrap();
        let mut trust = open_store(&dir);
        let member = UserId::new("carol");

        trust.add_trusted(&UserId::new("alice"), &member).unwrap();
        trust.add_trusted(&UserId::new("bob"), &member).unwrap();

        trust
            .remove_trusted(&UserId::new("alice"), &member)
            .unwrap();
        assert!(trust
            .list_trusted(&UserId::new("bob"))
            .any(|m| m == &member));
    }

    #[test]
    fn test_mutations_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let owner = UserId::new("alice");
        let member = UserId::new("bob");

        {
            let mut trust = open_store(&dir);
            trust.add_trusted(&owner, &member).unwrap();
            trust.add_blacklist(&UserId::new("mallory")).unwrap();
        }

        let trust = open_store(&dir);
        assert!(trust.list_trusted(&owner).any(|m| m == &member));
        assert!(trust.is_blacklisted(&UserId::new("mallory")));
    }

    #[test]
    fn test_blacklist_set_semantics() {
        let dir = TempDir::new().unwrap();
        let mut trust = open_store(&dir);
        let member = UserId::new("mallory");

        assert!(trust.add_blacklist(&member).unwrap());
        assert!(!trust.add_blacklist(&member).unwrap());
        assert_eq!(trust.list_blacklist().count(), 1);

        assert!(trust.remove_blacklist(&member).unwrap());
        assert!(!trust.remove_blacklist(&member).unwrap());
        assert_eq!(trust.list_blacklist().count(), 0);
    }

    #[test]
    fn test_failed_persist_is_not_acknowledged() {
        let dir = TempDir::new().unwrap();
        let mut trust = open_store(&dir);
        let owner = UserId::new("alice");

        trust.add_trusted(&owner, &UserId::new("bob")).unwrap();

        // Squat on the temp path so the next durable write fails.
        let tmp = dir.path().join("data.tmp");
        std::fs::create_dir(&tmp).unwrap();
        std::fs::write(tmp.join("squatter"), b"x").unwrap();

        let member = UserId::new("carol");
        assert!(trust.add_trusted(&owner, &member).is_err());
        // The failed mutation left in-memory state untouched.
        assert!(!trust.trusted_of(&owner).contains(&member));

        assert!(trust.remove_trusted(&owner, &UserId::new("bob")).is_err());
        assert!(trust.trusted_of(&owner).contains(&UserId::new("bob")));

        assert!(trust.add_blacklist(&UserId::new("mallory")).is_err());
        assert!(!trust.is_blacklisted(&UserId::new("mallory")));

        // Clearing the fault makes the same mutation succeed.
        std::fs::remove_dir_all(&tmp).unwrap();
        assert!(trust.add_trusted(&owner, &member).unwrap());
        assert!(trust.trusted_of(&owner).contains(&member));
    }

    #[test]
    fn test_list_trusted_is_restartable() {
        let dir = TempDir::new().unwrap();
        let mut trust = open_store(&dir);
        let owner = UserId::new("alice");

        trust.add_trusted(&owner, &UserId::new("bob")).unwrap();
        trust.add_trusted(&owner, &UserId::new("carol")).unwrap();

        let first: HashSet<_> = trust.list_trusted(&owner).cloned().collect();
        let second: HashSet<_> = trust.list_trusted(&owner).cloned().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }
}
