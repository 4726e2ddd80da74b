//! End-to-end lifecycle scenarios driven through the public API:
//! hub-triggered provisioning, trust-driven permission churn, sweeper
//! reclamation and the activity ledger trail they leave behind.

use roomwarden_core::core_sweeper::Sweeper;
use roomwarden_core::model::{ChannelId, Timestamp, UserId};
use roomwarden_core::test_utils::{lifecycle_at, InMemoryProvider};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn hub() -> ChannelId {
    ChannelId::new("hub")
}

fn todays_log(base: &Path) -> String {
    let name = format!("{}.log", chrono::Utc::now().format("%Y-%m-%d"));
    std::fs::read_to_string(base.join("logs").join(name)).unwrap_or_default()
}

#[tokio::test]
async fn hub_entry_provisions_room_with_ledger_trail() {
    let dir = tempfile::TempDir::new().unwrap();
    let provider = Arc::new(InMemoryProvider::with_hub(&hub(), &ChannelId::new("lounge")));
    let lifecycle = lifecycle_at(dir.path(), provider.clone(), hub());
    let owner = UserId::new("alice");

    let before = Timestamp::now();
    let record = lifecycle.on_entry_trigger(&owner, "Alice").await.unwrap();
    let after = Timestamp::now();

    // Deadline sits one grace period out from creation.
    let grace = lifecycle.grace_period();
    assert!(record.reclaim_at >= before.plus(grace));
    assert!(record.reclaim_at <= after.plus(grace));

    let room = provider.room(&record.room_id).unwrap();
    assert_eq!(room.name, "Alice's Private Call");
    assert!(room.occupants.contains(&owner));

    let summary = lifecycle.summary(&record.room_id).await.unwrap();
    assert_eq!(summary.room_name, "Alice's Private Call");
    assert!(summary.lines.iter().any(|l| l.contains("Channel Created")));

    let log = todays_log(dir.path());
    assert!(log.contains("Channel Created"));
    assert!(log.contains("Alice's Private Call"));
}

#[tokio::test]
async fn trust_revocation_evicts_guest_but_not_owner() {
    let dir = tempfile::TempDir::new().unwrap();
    let provider = Arc::new(InMemoryProvider::with_hub(&hub(), &ChannelId::new("lounge")));
    let lifecycle = lifecycle_at(dir.path(), provider.clone(), hub());
    let owner = UserId::new("alice");
    let guest = UserId::new("bob");

    lifecycle.add_trusted(&owner, &guest).await.unwrap();
    let record = lifecycle.on_entry_trigger(&owner, "Alice").await.unwrap();
    provider.occupy(&record.room_id, &guest);

    // While trusted, a permission reapply leaves the guest in place.
    lifecycle.on_trust_changed(&owner).await;
    assert!(!provider.disconnected().contains(&guest));

    lifecycle.remove_trusted(&owner, &guest).await.unwrap();
    assert!(provider.disconnected().contains(&guest));
    assert!(!provider.disconnected().contains(&owner));
    assert_eq!(lifecycle.trusted(&owner).await, Vec::<UserId>::new());
}

#[tokio::test]
async fn occupied_room_outlives_any_number_of_sweeps() {
    let dir = tempfile::TempDir::new().unwrap();
    let provider = Arc::new(InMemoryProvider::with_hub(&hub(), &ChannelId::new("lounge")));
    let lifecycle = Arc::new(lifecycle_at(dir.path(), provider.clone(), hub()));
    let sweeper = Sweeper::new(lifecycle.clone(), Duration::from_secs(60));

    let record = lifecycle
        .on_entry_trigger(&UserId::new("alice"), "Alice")
        .await
        .unwrap();

    let mut now = record.reclaim_at;
    for _ in 0..5 {
        now = now.plus(Duration::from_secs(3600));
        let report = sweeper.sweep_once(now).await;
        assert_eq!(report.reclaimed, 0);
        assert_eq!(report.refreshed, 1);
    }
    assert_eq!(lifecycle.rooms().await.len(), 1);

    // Each pass slid the deadline forward from its own clock.
    let rooms = lifecycle.rooms().await;
    assert_eq!(rooms[0].reclaim_at, now.plus(lifecycle.grace_period()));
}

#[tokio::test]
async fn empty_room_reclaimed_once_with_timeout_entry() {
    let dir = tempfile::TempDir::new().unwrap();
    let provider = Arc::new(InMemoryProvider::with_hub(&hub(), &ChannelId::new("lounge")));
    let lifecycle = Arc::new(lifecycle_at(dir.path(), provider.clone(), hub()));
    let sweeper = Sweeper::new(lifecycle.clone(), Duration::from_secs(60));

    let record = lifecycle
        .on_entry_trigger(&UserId::new("alice"), "Alice")
        .await
        .unwrap();
    provider.vacate_all(&record.room_id);

    let report = sweeper.sweep_once(record.reclaim_at).await;
    assert_eq!(report.reclaimed, 1);
    assert_eq!(provider.delete_calls(&record.room_id), 1);
    assert!(lifecycle.rooms().await.is_empty());
    assert!(lifecycle.summary(&record.room_id).await.is_none());

    let log = todays_log(dir.path());
    assert!(log.contains("Channel Deleted - Timeout"));

    // A later pass sees nothing; the delete is never repeated.
    let report = sweeper.sweep_once(record.reclaim_at.plus(Duration::from_secs(60))).await;
    assert_eq!(report.reclaimed, 0);
    assert_eq!(provider.delete_calls(&record.room_id), 1);
}

#[tokio::test]
async fn externally_deleted_room_logged_as_staff_action() {
    let dir = tempfile::TempDir::new().unwrap();
    let provider = Arc::new(InMemoryProvider::with_hub(&hub(), &ChannelId::new("lounge")));
    let lifecycle = Arc::new(lifecycle_at(dir.path(), provider.clone(), hub()));
    let sweeper = Sweeper::new(lifecycle.clone(), Duration::from_secs(60));

    let record = lifecycle
        .on_entry_trigger(&UserId::new("alice"), "Alice")
        .await
        .unwrap();
    provider.vanish(&record.room_id);

    let report = sweeper.sweep_once(Timestamp::now()).await;
    assert_eq!(report.vanished, 1);
    assert!(lifecycle.rooms().await.is_empty());
    // The resource was already gone; no delete is issued.
    assert_eq!(provider.delete_calls(&record.room_id), 0);

    let log = todays_log(dir.path());
    assert!(log.contains("Channel Deleted - Staff"));
}

#[tokio::test]
async fn state_survives_restart() {
    let dir = tempfile::TempDir::new().unwrap();
    let provider = Arc::new(InMemoryProvider::with_hub(&hub(), &ChannelId::new("lounge")));
    let owner = UserId::new("alice");
    let guest = UserId::new("bob");

    let record = {
        let lifecycle = lifecycle_at(dir.path(), provider.clone(), hub());
        lifecycle.add_trusted(&owner, &guest).await.unwrap();
        lifecycle.add_blacklist(&UserId::new("mallory")).await.unwrap();
        lifecycle.on_entry_trigger(&owner, "Alice").await.unwrap()
    };

    // A fresh instance over the same directory sees the same world.
    let lifecycle = lifecycle_at(dir.path(), provider.clone(), hub());
    assert_eq!(lifecycle.trusted(&owner).await, vec![guest]);
    assert_eq!(lifecycle.blacklist().await, vec![UserId::new("mallory")]);
    let rooms = lifecycle.rooms().await;
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].room_id, record.room_id);
    assert_eq!(rooms[0].reclaim_at, record.reclaim_at);
}

#[tokio::test]
async fn reapplying_unchanged_trust_is_idempotent() {
    let dir = tempfile::TempDir::new().unwrap();
    let provider = Arc::new(InMemoryProvider::with_hub(&hub(), &ChannelId::new("lounge")));
    let lifecycle = lifecycle_at(dir.path(), provider.clone(), hub());
    let owner = UserId::new("alice");

    lifecycle.add_trusted(&owner, &UserId::new("bob")).await.unwrap();
    let record = lifecycle.on_entry_trigger(&owner, "Alice").await.unwrap();

    let rules_before = provider.room(&record.room_id).unwrap().rules;
    lifecycle.on_trust_changed(&owner).await;
    lifecycle.on_trust_changed(&owner).await;
    let rules_after = provider.room(&record.room_id).unwrap().rules;

    assert_eq!(rules_before, rules_after);
    assert!(provider.disconnected().is_empty());
}
