// ABOUTME: Defines all error types for the cohort library using thiserror.
// ABOUTME: Each submodule has its own error enum, unified under CohortError.

/// Top-level error type for the cohort library.
#[derive(Debug, thiserror::Error)]
pub enum CohortError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Lock error: {0}")]
    Lock(#[from] LockError),
}

/// Errors from document store operations.
///
/// Reads never produce these: a missing or unreadable document reads as the
/// empty default. Only mutex I/O and writes can fail.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from resource lock operations.
///
/// Only the fail-closed helpers raise these; the plain `acquire`/`release`
/// calls report contention through their boolean result instead.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("Timed out acquiring lock on '{key}' after {waited_ms}ms")]
    Timeout { key: String, waited_ms: u64 },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
