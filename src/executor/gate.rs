// ABOUTME: The policy gate contract consumed before every step runs.
// ABOUTME: Gates may allow, reject with a reason, or rewrite the step.

use async_trait::async_trait;

use super::step::ActionStep;

/// A gate's verdict on one step.
#[derive(Debug, Clone)]
pub struct GateVerdict {
    /// Whether the step may run.
    pub allowed: bool,

    /// Human-readable rejection reason.
    pub reason: Option<String>,

    /// Optional sanitized replacement; when present the executor runs this
    /// step instead of the submitted one.
    pub step: Option<ActionStep>,
}

impl GateVerdict {
    /// Allow the step unchanged.
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
            step: None,
        }
    }

    /// Reject the step.
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            step: None,
        }
    }

    /// Allow a rewritten form of the step.
    pub fn rewrite(step: ActionStep) -> Self {
        Self {
            allowed: true,
            reason: None,
            step: Some(step),
        }
    }
}

/// External policy gate consulted before each step.
///
/// The gate's content (profanity filtering, rate limits) lives outside this
/// crate; only the call contract is used here. A rejected step records a
/// terminal failure and its handler is never invoked. A gate error is
/// treated as a rejection - the gate fails closed.
#[async_trait]
pub trait StepGate: Send + Sync {
    /// Check one step.
    async fn check_step(&self, step: &ActionStep) -> Result<GateVerdict, anyhow::Error>;
}

/// The default gate: allows everything.
pub struct AllowAll;

#[async_trait]
impl StepGate for AllowAll {
    async fn check_step(&self, _step: &ActionStep) -> Result<GateVerdict, anyhow::Error> {
        Ok(GateVerdict::allow())
    }
}
