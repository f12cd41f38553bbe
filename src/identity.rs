// ABOUTME: Defines AgentIdentity - the (ownerKey, agentId, role) triple that
// ABOUTME: every coordination component uses to identify its process.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of one agent process, constructed once at process startup and
/// shared by every coordination component in that process.
///
/// `owner_key` is the value written into leader and lock records; it must be
/// unique per process instance so that two restarts of the same agent never
/// mistake each other's leases for their own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AgentIdentity {
    /// Human-readable agent name (e.g. "miner-alpha").
    pub name: String,

    /// Position in the roster's 1..agentCount numbering.
    pub agent_id: u32,

    /// Role label used in leader records (e.g. "builder", "scout").
    pub role: String,

    /// Unique owner key for lease records.
    pub owner_key: String,
}

impl AgentIdentity {
    /// Create an identity with a fresh unique owner key.
    pub fn new(name: impl Into<String>, agent_id: u32, role: impl Into<String>) -> Self {
        let name = name.into();
        let owner_key = format!("{}#{}", name, Uuid::new_v4());
        Self {
            name,
            agent_id,
            role: role.into(),
            owner_key,
        }
    }

    /// Create an identity with an explicit owner key.
    ///
    /// Used when the key must survive restarts (e.g. derived from a
    /// configured instance id) instead of being regenerated.
    pub fn with_owner_key(
        name: impl Into<String>,
        agent_id: u32,
        role: impl Into<String>,
        owner_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            agent_id,
            role: role.into(),
            owner_key: owner_key.into(),
        }
    }
}
