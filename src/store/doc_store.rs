// ABOUTME: Implements DocStore - atomic read-modify-write of one shared JSON
// ABOUTME: document, serialized across processes by a companion mutex.

use std::future::Future;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::mutex::{DocMutex, FileMutex};
use crate::error::StoreError;
use crate::time::epoch_ms;

/// Documents that self-expire parts of their payload.
///
/// Every write prunes expired entries first, so an expired leader, lock, or
/// turn record is never persisted past the write that observes it.
pub trait Prune {
    /// Drop all entries whose lease has expired at `now_ms`.
    fn prune_expired(&mut self, now_ms: u64);
}

/// A shared JSON document plus the mutex that serializes access to it.
///
/// The document is created lazily on first write and never deleted; a missing
/// or unreadable file reads as the empty default. All mutation must happen
/// inside [`DocStore::with_lock`] - callers outside this crate must never
/// write the file directly.
pub struct DocStore<T> {
    path: PathBuf,
    mutex: Box<dyn DocMutex>,
    _doc: PhantomData<fn() -> T>,
}

impl<T> DocStore<T>
where
    T: Serialize + DeserializeOwned + Default + Prune,
{
    /// Open a store at `path`, guarded by a `<path>.lock` marker file.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = lock_path_for(&path);
        Self {
            path,
            mutex: Box::new(FileMutex::new(lock_path)),
            _doc: PhantomData,
        }
    }

    /// Open a store with an explicit mutex backend.
    pub fn with_mutex(path: impl Into<PathBuf>, mutex: Box<dyn DocMutex>) -> Self {
        Self {
            path: path.into(),
            mutex,
            _doc: PhantomData,
        }
    }

    /// The document path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document, or the empty default if missing or unreadable.
    ///
    /// Reads never raise: a torn or corrupt file surfaces as the default and
    /// will be repaired by the next locked write.
    pub async fn read(&self) -> T {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "unreadable document, using default"
                    );
                    T::default()
                }
            },
            Err(_) => T::default(),
        }
    }

    /// Prune expired entries, then serialize and replace the document.
    ///
    /// Written pretty-printed so operators can inspect the coordination state
    /// with a pager.
    pub async fn write(&self, doc: &mut T) -> Result<(), StoreError> {
        doc.prune_expired(epoch_ms());
        let bytes = serde_json::to_vec_pretty(doc)?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }

    /// Run `f` under the document mutex.
    ///
    /// Single non-blocking acquire attempt: returns `Ok(None)` when the mutex
    /// is held elsewhere - the caller decides whether to retry on a later
    /// tick. The mutex is always released, even when `f` errors.
    pub async fn with_lock<F, Fut, R>(&self, f: F) -> Result<Option<R>, StoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<R, StoreError>>,
    {
        if !self.mutex.try_acquire().await? {
            return Ok(None);
        }

        let result = f().await;
        let released = self.mutex.release().await;

        let value = result?;
        released?;
        Ok(Some(value))
    }
}

fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".lock");
    path.with_file_name(name)
}
