// ABOUTME: Per-resource mutual exclusion with TTL leases and bounded polling.
// ABOUTME: One live owner per resource key; re-entrant acquire refreshes.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::document::{CoordinationDoc, LockRecord};
use crate::error::{LockError, StoreError};
use crate::identity::AgentIdentity;
use crate::store::DocStore;
use crate::time::epoch_ms;

/// Tuning for one acquire attempt.
#[derive(Debug, Clone, Copy)]
pub struct AcquireOptions {
    /// Total time to keep polling before giving up.
    pub wait_ms: u64,

    /// Interval between polls.
    pub poll_ms: u64,

    /// Lease length written on success.
    pub ttl_ms: u64,
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self {
            wait_ms: 5_000,
            poll_ms: 250,
            ttl_ms: 60_000,
        }
    }
}

/// Mutual exclusion per resource key (a chest, a crafting spot, a doorway).
///
/// Locks are leases: a holder that stops refreshing loses the key after
/// `ttl_ms` and someone else may take it. At most one live owner exists per
/// key at any instant; acquire by the current owner refreshes the lease
/// instead of deadlocking.
pub struct ResourceLockManager {
    store: Arc<DocStore<CoordinationDoc>>,
    identity: AgentIdentity,
}

impl ResourceLockManager {
    /// Create a manager for one identity over one coordination domain.
    pub fn new(store: Arc<DocStore<CoordinationDoc>>, identity: AgentIdentity) -> Self {
        Self { store, identity }
    }

    /// The identity this manager locks as.
    pub fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    /// Acquire the lock on `key`, polling until `wait_ms` elapses.
    ///
    /// Each poll takes the document mutex once and succeeds iff the lock is
    /// absent, expired, or already owned by this identity. Returns `false` on
    /// timeout; callers needing strict exclusion must check this result.
    pub async fn acquire(&self, key: &str, opts: AcquireOptions) -> Result<bool, StoreError> {
        let deadline = Instant::now() + Duration::from_millis(opts.wait_ms);

        loop {
            if self.try_take(key, opts.ttl_ms).await? == Some(true) {
                return Ok(true);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::debug!(key, wait_ms = opts.wait_ms, "lock acquire timed out");
                return Ok(false);
            }
            tokio::time::sleep(remaining.min(Duration::from_millis(opts.poll_ms))).await;
        }
    }

    /// Release the lock on `key`.
    ///
    /// Deletes the entry only if the recorded owner is this identity, so a
    /// lease that silently expired and was reacquired by someone else is
    /// never released out from under the new owner. Returns `false` when the
    /// mutex was contended or the lock was not ours.
    pub async fn release(&self, key: &str) -> Result<bool, StoreError> {
        let released = self
            .store
            .with_lock(|| async move {
                let mut doc = self.store.read().await;

                let ours = doc
                    .locks
                    .get(key)
                    .is_some_and(|lock| lock.owner == self.identity.owner_key);
                if !ours {
                    return Ok(false);
                }

                doc.locks.remove(key);
                self.store.write(&mut doc).await?;
                Ok(true)
            })
            .await?;

        Ok(released.unwrap_or(false))
    }

    /// One mutex-serialized take attempt.
    ///
    /// `None` means the document mutex was contended; `Some(false)` means a
    /// live lock is held by someone else.
    async fn try_take(&self, key: &str, ttl_ms: u64) -> Result<Option<bool>, StoreError> {
        self.store
            .with_lock(|| async move {
                let mut doc = self.store.read().await;
                let now = epoch_ms();

                let ours = |lock: &LockRecord| {
                    lock.is_live(now) && lock.owner == self.identity.owner_key
                };

                match doc.locks.get(key).cloned() {
                    Some(lock) if lock.is_live(now) && !ours(&lock) => Ok(false),
                    existing => {
                        // Re-entrant refresh keeps the original owner_since.
                        let owner_since = existing
                            .filter(|lock| ours(lock))
                            .map(|lock| lock.owner_since)
                            .unwrap_or(now);

                        doc.locks.insert(
                            key.to_string(),
                            LockRecord {
                                owner: self.identity.owner_key.clone(),
                                owner_since,
                                expires_at: now + ttl_ms,
                            },
                        );
                        self.store.write(&mut doc).await?;
                        Ok(true)
                    }
                }
            })
            .await
    }
}

/// Scoped critical section: acquire, run `f`, always release.
///
/// On acquire timeout `f` still runs *without* the lock - a best-effort
/// degrade, logged at warn level. Callers for whom running unlocked is a
/// correctness hazard must use [`with_resource_lock_strict`] instead; the two
/// behave observably differently under contention.
pub async fn with_resource_lock<F, Fut, R>(
    manager: &ResourceLockManager,
    key: &str,
    opts: AcquireOptions,
    f: F,
) -> Result<R, StoreError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = R>,
{
    let held = manager.acquire(key, opts).await?;
    if !held {
        tracing::warn!(key, "proceeding without resource lock");
    }

    let value = f().await;

    if held && !manager.release(key).await.unwrap_or(false) {
        tracing::warn!(key, "failed to release resource lock");
    }
    Ok(value)
}

/// Fail-closed variant of [`with_resource_lock`].
///
/// Returns [`LockError::Timeout`] without running `f` when the lock cannot
/// be acquired within `wait_ms`.
pub async fn with_resource_lock_strict<F, Fut, R>(
    manager: &ResourceLockManager,
    key: &str,
    opts: AcquireOptions,
    f: F,
) -> Result<R, LockError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = R>,
{
    if !manager.acquire(key, opts).await? {
        return Err(LockError::Timeout {
            key: key.to_string(),
            waited_ms: opts.wait_ms,
        });
    }

    let value = f().await;

    if !manager.release(key).await? {
        tracing::warn!(key, "failed to release resource lock");
    }
    Ok(value)
}
