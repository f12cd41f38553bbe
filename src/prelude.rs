// ABOUTME: Prelude module - convenient imports for common use cases.
// ABOUTME: Use `use cohort::prelude::*;` to get started quickly.

pub use crate::coord::{
    AcquireOptions, CoordinationDoc, LeaderDecision, LeaderElector, LeaderRecord, LockRecord,
    ResourceLockManager, with_resource_lock, with_resource_lock_strict,
};
pub use crate::error::{CohortError, LockError, StoreError};
pub use crate::executor::{
    AbortToken, ActionExecutor, ActionHandler, ActionLogEntry, ActionResult, ActionStatus,
    ActionStep, AllowAll, ExecutorConfig, GateVerdict, HandlerRegistry, LogStatus, StepGate,
};
pub use crate::identity::AgentIdentity;
pub use crate::plan::{
    AgentRosterEntry, AgentStatus, PlanStatus, PlanningState, RosterFile, StepClaim, TeamPlanFile,
    TeamPlanStore, TurnVerdict,
};
pub use crate::store::{DocMutex, DocStore, FileMutex, Prune};
