// ABOUTME: On-disk schema for one coordination domain - the leader record
// ABOUTME: plus the per-resource lock table, all lease-based.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::store::Prune;

/// The shared document for one coordination domain.
///
/// One file per domain (e.g. per world or per team). Created lazily, mutated
/// only inside the store mutex, never deleted - stale entries self-expire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinationDoc {
    /// Current leader lease, if any.
    pub leader: Option<LeaderRecord>,

    /// Resource key to lock lease.
    #[serde(default)]
    pub locks: HashMap<String, LockRecord>,
}

/// A leader lease for one goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderRecord {
    /// The goal this leadership is scoped to.
    pub goal: String,

    /// Unique owner key of the leading process.
    pub owner_key: String,

    /// Role label of the leader.
    pub role: String,

    /// Roster id of the leader.
    pub agent_id: u32,

    /// When the leader was elected, epoch ms.
    pub elected_at: u64,

    /// Lease end, epoch ms. The record is live iff `now < expires_at`.
    pub expires_at: u64,
}

impl LeaderRecord {
    /// Whether this lease is still live at `now_ms`.
    pub fn is_live(&self, now_ms: u64) -> bool {
        now_ms < self.expires_at
    }
}

/// A resource lock lease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockRecord {
    /// Unique owner key of the holding process.
    pub owner: String,

    /// When the lock was first taken, epoch ms.
    pub owner_since: u64,

    /// Lease end, epoch ms.
    pub expires_at: u64,
}

impl LockRecord {
    /// Whether this lease is still live at `now_ms`.
    pub fn is_live(&self, now_ms: u64) -> bool {
        now_ms < self.expires_at
    }
}

impl Prune for CoordinationDoc {
    fn prune_expired(&mut self, now_ms: u64) {
        if let Some(leader) = &self.leader {
            if !leader.is_live(now_ms) {
                self.leader = None;
            }
        }
        self.locks.retain(|_, lock| lock.is_live(now_ms));
    }
}
