// ABOUTME: Executor module - runs ordered action plans against registered handlers.
// ABOUTME: Dedup, retry with backoff, policy gating, cooperative abort, audit log.

mod abort;
mod executor;
mod gate;
mod handler;
mod step;

pub use abort::AbortToken;
pub use executor::{ActionExecutor, ExecutorConfig};
pub use gate::{AllowAll, GateVerdict, StepGate};
pub use handler::{ActionHandler, HandlerRegistry};
pub use step::{ActionLogEntry, ActionResult, ActionStatus, ActionStep, LogStatus};
