//! Permission Policy Engine
//!
//! Pure derivation of a room's permission rule set and eviction set from
//! the owner's trust data and the room's current occupants. No side
//! effects, no incremental diffing: the plan is recomputed from scratch on
//! every invocation and identical inputs always yield an identical plan,
//! so re-applying a plan is safe. The global blacklist is intentionally
//! not consulted here.

use crate::model::UserId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Capabilities a rule can grant or withhold on a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomPermission {
    /// See the room in listings
    ViewRoom,
    /// Join the room
    Connect,
    /// Edit the room itself
    ManageRoom,
    /// Move members between rooms
    MoveMembers,
    /// Server-mute members
    MuteMembers,
}

/// Who a permission rule applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleTarget {
    /// The general population of the community
    Everyone,
    /// A single member
    Member(UserId),
}

/// One allow/deny rule in a room's permission set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRule {
    pub target: RuleTarget,
    pub allow: Vec<RoomPermission>,
    pub deny: Vec<RoomPermission>,
}

impl PermissionRule {
    fn allow(target: RuleTarget, allow: Vec<RoomPermission>) -> Self {
        PermissionRule {
            target,
            allow,
            deny: Vec::new(),
        }
    }

    fn deny(target: RuleTarget, deny: Vec<RoomPermission>) -> Self {
        PermissionRule {
            target,
            allow: Vec::new(),
            deny,
        }
    }
}

/// The full target state for one room: rules to apply plus occupants to remove
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionPlan {
    /// Complete permission rule set, replacing whatever the room has now
    pub rules: Vec<PermissionRule>,

    /// Current occupants who are neither the owner nor trusted
    pub evictions: Vec<UserId>,
}

/// Derive the permission plan for a room
///
/// Rules, in order: deny connect for everyone; full control for the owner;
/// connect for each trusted member (sorted for determinism). The eviction
/// set is every occupant outside `{owner} ∪ trusted`.
pub fn derive_plan(
    owner: &UserId,
    trusted: &HashSet<UserId>,
    occupants: &HashSet<UserId>,
) -> PermissionPlan {
    let mut rules = Vec::with_capacity(trusted.len() + 2);

    rules.push(PermissionRule::deny(
        RuleTarget::Everyone,
        vec![RoomPermission::Connect],
    ));

    rules.push(PermissionRule::allow(
        RuleTarget::Member(owner.clone()),
        vec![
            RoomPermission::ViewRoom,
            RoomPermission::Connect,
            RoomPermission::ManageRoom,
            RoomPermission::MoveMembers,
            RoomPermission::MuteMembers,
        ],
    ));

    let mut trusted_sorted: Vec<&UserId> = trusted.iter().collect();
    trusted_sorted.sort();
    for member in trusted_sorted {
        rules.push(PermissionRule::allow(
            RuleTarget::Member(member.clone()),
            vec![RoomPermission::Connect],
        ));
    }

    let mut evictions: Vec<UserId> = occupants
        .iter()
        .filter(|occupant| *occupant != owner && !trusted.contains(occupant))
        .cloned()
        .collect();
    evictions.sort();

    PermissionPlan { rules, evictions }
}
