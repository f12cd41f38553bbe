// ABOUTME: Sticky cooperative cancellation token for plan execution.
// ABOUTME: Set once, observed at checkpoints, cleared only at the next plan start.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A sticky abort flag shared between the executor and its callers.
///
/// Clones share the same flag, so a handle obtained before `execute_plan`
/// can cancel the plan from another task. Cancellation is cooperative: the
/// executor checks the flag at step boundaries and after each handler
/// invocation, and handlers driving long external operations receive the
/// token so they can bail out at their own checkpoints. Nothing is ever
/// preempted mid-instruction.
///
/// Once triggered the flag stays set - suppressing all further work - until
/// the start of the *next* `execute_plan` call clears it.
#[derive(Debug, Clone, Default)]
pub struct AbortToken {
    flag: Arc<AtomicBool>,
}

impl AbortToken {
    /// Create a fresh, untriggered token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether the flag is raised.
    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Lower the flag. Only the executor calls this, at plan start.
    pub(crate) fn clear(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
