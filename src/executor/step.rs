// ABOUTME: Action step, result, and audit log entry types.
// ABOUTME: Results carry terminal statuses only; the log also records progress.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One requested operation.
///
/// `id` must be unique within the submitting process's dedup horizon: an id
/// that ever succeeded is never run again by the same executor instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionStep {
    pub id: String,

    /// Handler name, e.g. "move_to" or "craft".
    pub action: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ActionStep {
    /// Create a step with no params or description.
    pub fn new(id: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            action: action.into(),
            params: None,
            description: None,
        }
    }

    /// Attach params.
    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Terminal outcome of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Success,
    Failed,
    Skipped,
    Aborted,
}

/// Result returned to the caller for one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub id: String,
    pub action: String,
    pub status: ActionStatus,

    /// Handler invocations made for this step. Zero when the handler was
    /// never invoked (skipped, gate-rejected, unsupported, pre-aborted).
    pub attempts: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Log statuses: the terminal set plus in-progress markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Started,
    Retry,
    Success,
    Failed,
    Skipped,
    Aborted,
}

impl From<ActionStatus> for LogStatus {
    fn from(status: ActionStatus) -> Self {
        match status {
            ActionStatus::Success => LogStatus::Success,
            ActionStatus::Failed => LogStatus::Failed,
            ActionStatus::Skipped => LogStatus::Skipped,
            ActionStatus::Aborted => LogStatus::Aborted,
        }
    }
}

/// One append-only audit log entry. Never mutated post-append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionLogEntry {
    pub id: String,
    pub action: String,
    pub status: LogStatus,
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub timestamp: u64,
}
