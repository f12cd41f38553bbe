// ABOUTME: Plan module - turn-based team plan drafting and step claiming.
// ABOUTME: Contains the pure protocol state machine and the roster view.

mod protocol;
mod roster;

pub use protocol::{
    DEFAULT_TURN_STALE_MS, PlanStatus, PlanningState, StepClaim, TeamPlanFile, TurnVerdict,
};
pub use roster::{AgentRosterEntry, AgentStatus, RosterFile};

use crate::store::DocStore;

/// Persisted team-plan document, mutated under the same mutex discipline as
/// the coordination document.
pub type TeamPlanStore = DocStore<TeamPlanFile>;
