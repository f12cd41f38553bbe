// ABOUTME: The team plan document and its turn/claim state machine.
// ABOUTME: All mutating operations are pure; persistence is layered by callers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::Prune;

/// Default staleness timeout for a mutex-mode turn owner.
pub const DEFAULT_TURN_STALE_MS: u64 = 60_000;

fn default_stale_ms() -> u64 {
    DEFAULT_TURN_STALE_MS
}

/// Lifecycle of a team plan document. One-way: drafting becomes ready exactly
/// once, when the leader publishes a non-null team plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    Drafting,
    Ready,
}

/// Turn-taking sub-state, fixed at plan creation.
///
/// The two modes carry disjoint payloads, so a sequence plan can never hold a
/// mutex owner slot and vice versa.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum PlanningState {
    /// Strict round-robin by ascending agent id 1..agentCount.
    #[serde(rename_all = "camelCase")]
    Sequence {
        agent_count: u32,
        current_agent_id: u32,
        #[serde(default)]
        completed_agent_ids: Vec<u32>,
    },

    /// A single mutable owner slot with a staleness timeout.
    #[serde(rename_all = "camelCase")]
    Mutex {
        owner: Option<String>,
        owner_since: Option<u64>,
        #[serde(default = "default_stale_ms")]
        stale_ms: u64,
        #[serde(default)]
        completed_owners: Vec<String>,
    },
}

impl PlanningState {
    /// Round-robin turns for `agent_count` agents, starting at id 1.
    pub fn sequence(agent_count: u32) -> Self {
        Self::Sequence {
            agent_count,
            current_agent_id: 1,
            completed_agent_ids: Vec::new(),
        }
    }

    /// Single-slot turns with the default staleness timeout.
    pub fn mutex() -> Self {
        Self::mutex_with_staleness(DEFAULT_TURN_STALE_MS)
    }

    /// Single-slot turns with an explicit staleness timeout.
    pub fn mutex_with_staleness(stale_ms: u64) -> Self {
        Self::Mutex {
            owner: None,
            owner_since: None,
            stale_ms,
            completed_owners: Vec::new(),
        }
    }
}

/// One agent's claimed step ids within a plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepClaim {
    pub step_ids: Vec<String>,
    pub updated_at: u64,
}

/// Verdict of a turn claim attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnVerdict {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl TurnVerdict {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

/// The shared team plan document for one objective.
///
/// Created lazily on first access, mutated only inside a mutex-protected
/// read-modify-write (see [`crate::store::DocStore::with_lock`]), never
/// deleted. All operations here are pure: they return a new document value
/// and leave persistence to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPlanFile {
    /// The shared objective.
    pub goal: String,

    /// Drafting until the leader publishes, then ready.
    pub status: PlanStatus,

    /// Creation time, epoch ms.
    pub created_at: u64,

    /// Last mutation time, epoch ms.
    pub updated_at: u64,

    /// Owner key of the drafting leader.
    pub leader: String,

    /// The published plan body; null while drafting.
    pub team_plan: Option<Value>,

    /// Turn-taking state.
    pub planning: PlanningState,

    /// Agent key to claimed step ids. Claim sets only grow.
    #[serde(default)]
    pub claims: HashMap<String, StepClaim>,

    /// Optional provenance marker for plans seeded from another objective.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_origin: Option<String>,
}

impl Default for TeamPlanFile {
    fn default() -> Self {
        Self {
            goal: String::new(),
            status: PlanStatus::Drafting,
            created_at: 0,
            updated_at: 0,
            leader: String::new(),
            team_plan: None,
            planning: PlanningState::mutex(),
            claims: HashMap::new(),
            shared_origin: None,
        }
    }
}

impl TeamPlanFile {
    /// Create a fresh drafting plan.
    pub fn new(
        goal: impl Into<String>,
        leader: impl Into<String>,
        planning: PlanningState,
        now_ms: u64,
    ) -> Self {
        Self {
            goal: goal.into(),
            status: PlanStatus::Drafting,
            created_at: now_ms,
            updated_at: now_ms,
            leader: leader.into(),
            team_plan: None,
            planning,
            claims: HashMap::new(),
            shared_origin: None,
        }
    }

    /// Attempt to take the drafting turn.
    ///
    /// Sequence mode: allowed only when `agent_id` matches the current slot
    /// and has not already completed. Mutex mode: allowed when the slot is
    /// free, stale, or already held by `agent_key`; taking it (re)stamps
    /// `owner_since`. In both modes an identity marked completed for this
    /// plan instance is rejected permanently.
    pub fn claim_turn(&self, agent_key: &str, agent_id: u32, now_ms: u64) -> (Self, TurnVerdict) {
        let mut next = self.clone();

        let verdict = match &mut next.planning {
            PlanningState::Sequence {
                current_agent_id,
                completed_agent_ids,
                ..
            } => {
                if completed_agent_ids.contains(&agent_id) {
                    TurnVerdict::deny(format!("agent {agent_id} already completed its turn"))
                } else if agent_id != *current_agent_id {
                    TurnVerdict::deny(format!(
                        "turn belongs to agent {current_agent_id}, not {agent_id}"
                    ))
                } else {
                    TurnVerdict::allow()
                }
            }
            PlanningState::Mutex {
                owner,
                owner_since,
                stale_ms,
                completed_owners,
            } => {
                if completed_owners.iter().any(|o| o == agent_key) {
                    TurnVerdict::deny(format!("'{agent_key}' already completed its turn"))
                } else {
                    let stale = owner_since
                        .map(|since| now_ms.saturating_sub(since) > *stale_ms)
                        .unwrap_or(true);
                    let free = match owner.as_deref() {
                        None => true,
                        Some(current) => current == agent_key || stale,
                    };
                    if free {
                        *owner = Some(agent_key.to_string());
                        *owner_since = Some(now_ms);
                        TurnVerdict::allow()
                    } else {
                        TurnVerdict::deny(format!(
                            "turn held by '{}'",
                            owner.as_deref().unwrap_or_default()
                        ))
                    }
                }
            }
        };

        if verdict.allowed {
            next.updated_at = now_ms;
            (next, verdict)
        } else {
            (self.clone(), verdict)
        }
    }

    /// Finish the caller's turn.
    ///
    /// Marks the caller completed for this plan instance - it can never
    /// reacquire the turn - and hands the slot on (sequence: increment the
    /// current id, saturating at `agent_count`; mutex: clear the owner slot).
    pub fn advance_turn(&self, agent_key: &str, agent_id: u32, now_ms: u64) -> Self {
        let mut next = self.clone();

        match &mut next.planning {
            PlanningState::Sequence {
                agent_count,
                current_agent_id,
                completed_agent_ids,
            } => {
                if !completed_agent_ids.contains(&agent_id) {
                    completed_agent_ids.push(agent_id);
                }
                *current_agent_id = (*current_agent_id + 1).min(*agent_count);
            }
            PlanningState::Mutex {
                owner,
                owner_since,
                completed_owners,
                ..
            } => {
                *owner = None;
                *owner_since = None;
                if !completed_owners.iter().any(|o| o == agent_key) {
                    completed_owners.push(agent_key.to_string());
                }
            }
        }

        next.updated_at = now_ms;
        next
    }

    /// Union `step_ids` into `agent_key`'s claim set.
    ///
    /// Idempotent; performs no cross-agent collision check. Callers must
    /// consult [`TeamPlanFile::list_claimed_steps`] first to avoid
    /// re-claiming another agent's steps.
    pub fn record_claim(&self, agent_key: &str, step_ids: &[String], now_ms: u64) -> Self {
        let mut next = self.clone();

        let claim = next.claims.entry(agent_key.to_string()).or_default();
        for id in step_ids {
            if !claim.step_ids.contains(id) {
                claim.step_ids.push(id.clone());
            }
        }
        claim.updated_at = now_ms;

        next.updated_at = now_ms;
        next
    }

    /// All claimed step ids across every agent, flattened.
    pub fn list_claimed_steps(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .claims
            .values()
            .flat_map(|claim| claim.step_ids.iter().cloned())
            .collect();
        ids.sort();
        ids
    }

    /// Publish the drafted plan, transitioning drafting to ready.
    ///
    /// The transition happens exactly once; publishing onto an already ready
    /// plan returns it unchanged.
    pub fn publish_plan(&self, team_plan: Value, now_ms: u64) -> Self {
        if self.status == PlanStatus::Ready {
            return self.clone();
        }

        let mut next = self.clone();
        next.team_plan = Some(team_plan);
        next.status = PlanStatus::Ready;
        next.updated_at = now_ms;
        next
    }
}

impl Prune for TeamPlanFile {
    fn prune_expired(&mut self, now_ms: u64) {
        if let PlanningState::Mutex {
            owner,
            owner_since,
            stale_ms,
            ..
        } = &mut self.planning
        {
            let stale = owner_since
                .map(|since| now_ms.saturating_sub(since) > *stale_ms)
                .unwrap_or(false);
            if owner.is_some() && stale {
                *owner = None;
                *owner_since = None;
            }
        }
    }
}
