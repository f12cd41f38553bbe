// ABOUTME: Read-only view of the agent roster document.
// ABOUTME: Identity, role, and liveness for every known agent process.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Reported status of one agent process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Active,
    Inactive,
    Crashed,
}

/// One roster entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRosterEntry {
    pub name: String,
    pub agent_id: u32,
    pub role: String,
    pub status: AgentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_heartbeat: Option<u64>,
}

impl AgentRosterEntry {
    /// Whether this agent should be treated as live.
    ///
    /// An active agent with no recorded heartbeat counts as live - entries
    /// are appended before the first heartbeat lands.
    pub fn is_live(&self, now_ms: u64, heartbeat_ttl_ms: u64) -> bool {
        if self.status != AgentStatus::Active {
            return false;
        }
        match self.last_heartbeat {
            Some(beat) => now_ms.saturating_sub(beat) <= heartbeat_ttl_ms,
            None => true,
        }
    }
}

/// The append-only membership document, consumed read-only here.
///
/// Another subsystem owns writes; this module never mutates the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterFile {
    pub created_at: u64,
    pub updated_at: u64,
    pub agent_count: u32,
    #[serde(default)]
    pub agents: Vec<AgentRosterEntry>,
}

impl RosterFile {
    /// Load the roster, or the empty default if missing or unreadable.
    ///
    /// Same never-raise discipline as document reads elsewhere: a torn file
    /// reads as empty and the owning subsystem repairs it on its next write.
    pub async fn load(path: impl AsRef<Path>) -> Self {
        match tokio::fs::read(path.as_ref()).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(roster) => roster,
                Err(e) => {
                    tracing::warn!(
                        path = %path.as_ref().display(),
                        error = %e,
                        "unreadable roster, using empty default"
                    );
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// All agents currently marked active.
    pub fn active_agents(&self) -> Vec<&AgentRosterEntry> {
        self.agents
            .iter()
            .filter(|a| a.status == AgentStatus::Active)
            .collect()
    }

    /// Find an agent by roster id.
    pub fn find(&self, agent_id: u32) -> Option<&AgentRosterEntry> {
        self.agents.iter().find(|a| a.agent_id == agent_id)
    }
}
