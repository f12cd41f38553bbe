// ABOUTME: Defines the DocMutex trait and its file-backed implementation.
// ABOUTME: Atomic exclusive file creation is the only true cross-process primitive.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::OpenOptions;

use crate::error::StoreError;

/// A cross-process mutex guarding one coordination document.
///
/// `try_acquire` is non-blocking and single-attempt: contention is reported
/// through the boolean result, never as an error. The backend is swappable
/// (a key-value store's conditional put would satisfy the same contract on
/// multi-host deployments); everything above this trait only depends on the
/// acquire/release semantics.
#[async_trait]
pub trait DocMutex: Send + Sync {
    /// Attempt to acquire the mutex. Returns `false` if already held.
    async fn try_acquire(&self) -> Result<bool, StoreError>;

    /// Release the mutex. Releasing an unheld mutex is not an error.
    async fn release(&self) -> Result<(), StoreError>;
}

/// File-backed mutex: a zero-byte marker file at a well-known path.
///
/// Existence means held, absence means free. Acquire is an atomic
/// fail-if-exists creation, release deletes the file.
///
/// # Operational hazard
///
/// The marker file carries no expiry - only the payload records inside the
/// guarded document do. A process that crashes between acquire and release
/// leaves the file behind and wedges that coordination domain until someone
/// removes the file by hand. Holders keep their critical sections to a single
/// read-modify-write to shrink that window, but the hazard is inherent to
/// the design.
pub struct FileMutex {
    path: PathBuf,
}

impl FileMutex {
    /// Create a mutex at the given marker path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The marker file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DocMutex for FileMutex {
    async fn try_acquire(&self) -> Result<bool, StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                tracing::debug!(path = %self.path.display(), "mutex contended");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn release(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
