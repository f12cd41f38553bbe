// ABOUTME: Tests for resource locking - lease exclusivity, re-entrancy,
// ABOUTME: ownership-checked release, and the degrade/fail-closed helpers.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use super::*;
use crate::error::LockError;
use crate::identity::AgentIdentity;
use crate::store::DocStore;

fn setup(dir: &tempfile::TempDir) -> Arc<DocStore<CoordinationDoc>> {
    Arc::new(DocStore::open(dir.path().join("coordination.json")))
}

fn manager(store: &Arc<DocStore<CoordinationDoc>>, name: &str, id: u32) -> ResourceLockManager {
    ResourceLockManager::new(Arc::clone(store), AgentIdentity::new(name, id, "worker"))
}

fn opts(wait_ms: u64, poll_ms: u64, ttl_ms: u64) -> AcquireOptions {
    AcquireOptions {
        wait_ms,
        poll_ms,
        ttl_ms,
    }
}

#[tokio::test]
async fn test_acquire_free_key() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(&dir);
    let x = manager(&store, "x", 1);

    assert!(x.acquire("chest:0,64,0", opts(100, 20, 60_000)).await.unwrap());
}

#[tokio::test]
async fn test_reentrant_acquire_refreshes_lease() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(&dir);
    let x = manager(&store, "x", 1);

    assert!(x.acquire("chest", opts(100, 20, 60_000)).await.unwrap());
    let first = store.read().await.locks["chest"].clone();

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(x.acquire("chest", opts(100, 20, 60_000)).await.unwrap());
    let second = store.read().await.locks["chest"].clone();

    assert_eq!(second.owner_since, first.owner_since, "refresh keeps the original claim time");
    assert!(second.expires_at > first.expires_at);
}

#[tokio::test]
async fn test_contended_acquire_times_out_then_wins_after_expiry() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(&dir);
    let x = manager(&store, "x", 1);
    let y = manager(&store, "y", 2);

    assert!(x.acquire("furnace", opts(100, 20, 300)).await.unwrap());

    // Still held: poll until the wait window runs out.
    assert!(!y.acquire("furnace", opts(150, 50, 300)).await.unwrap());

    // After x's lease expires the key is free.
    tokio::time::sleep(Duration::from_millis(320)).await;
    assert!(y.acquire("furnace", opts(150, 50, 300)).await.unwrap());
}

#[tokio::test]
async fn test_no_two_live_owners() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(&dir);
    let x = manager(&store, "x", 1);
    let y = manager(&store, "y", 2);

    assert!(x.acquire("door", opts(100, 20, 60_000)).await.unwrap());
    assert!(!y.acquire("door", opts(100, 20, 60_000)).await.unwrap());

    let doc = store.read().await;
    assert_eq!(doc.locks["door"].owner, x.identity().owner_key);
}

#[tokio::test]
async fn test_release_then_other_acquires() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(&dir);
    let x = manager(&store, "x", 1);
    let y = manager(&store, "y", 2);

    assert!(x.acquire("door", opts(100, 20, 60_000)).await.unwrap());
    assert!(x.release("door").await.unwrap());
    assert!(y.acquire("door", opts(100, 20, 60_000)).await.unwrap());
}

#[tokio::test]
async fn test_release_by_non_owner_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(&dir);
    let x = manager(&store, "x", 1);
    let y = manager(&store, "y", 2);

    assert!(x.acquire("door", opts(100, 20, 60_000)).await.unwrap());
    assert!(!y.release("door").await.unwrap());

    assert!(store.read().await.locks.contains_key("door"));
}

#[tokio::test]
async fn test_release_after_silent_expiry_and_reacquire() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(&dir);
    let x = manager(&store, "x", 1);
    let y = manager(&store, "y", 2);

    assert!(x.acquire("anvil", opts(100, 20, 40)).await.unwrap());
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert!(y.acquire("anvil", opts(100, 20, 60_000)).await.unwrap());

    // x's lease silently expired; it must not release y's lock.
    assert!(!x.release("anvil").await.unwrap());
    let doc = store.read().await;
    assert_eq!(doc.locks["anvil"].owner, y.identity().owner_key);
}

#[tokio::test]
async fn test_with_resource_lock_runs_and_releases() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(&dir);
    let x = manager(&store, "x", 1);
    let y = manager(&store, "y", 2);

    let counter = Arc::new(AtomicU32::new(0));
    let c = Arc::clone(&counter);

    let value = with_resource_lock(&x, "chest", opts(100, 20, 60_000), || async move {
        c.fetch_add(1, Ordering::SeqCst);
        "done"
    })
    .await
    .unwrap();

    assert_eq!(value, "done");
    assert_eq!(counter.load(Ordering::SeqCst), 1);

    // Released on exit.
    assert!(y.acquire("chest", opts(100, 20, 60_000)).await.unwrap());
}

/// The degrade default: on acquire timeout the critical section still runs,
/// just without the lock. Callers needing strict exclusion must use the
/// fail-closed variant.
#[tokio::test]
async fn test_with_resource_lock_degrades_without_lock() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(&dir);
    let x = manager(&store, "x", 1);
    let y = manager(&store, "y", 2);

    assert!(x.acquire("chest", opts(100, 20, 60_000)).await.unwrap());

    let ran = Arc::new(AtomicU32::new(0));
    let r = Arc::clone(&ran);

    with_resource_lock(&y, "chest", opts(60, 20, 60_000), || async move {
        r.fetch_add(1, Ordering::SeqCst);
    })
    .await
    .unwrap();

    assert_eq!(ran.load(Ordering::SeqCst), 1, "degrade still runs the section");
    // x's lock must survive: y never held it, so nothing was released.
    assert_eq!(store.read().await.locks["chest"].owner, x.identity().owner_key);
}

#[tokio::test]
async fn test_with_resource_lock_strict_fails_closed() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(&dir);
    let x = manager(&store, "x", 1);
    let y = manager(&store, "y", 2);

    assert!(x.acquire("chest", opts(100, 20, 60_000)).await.unwrap());

    let ran = Arc::new(AtomicU32::new(0));
    let r = Arc::clone(&ran);

    let result = with_resource_lock_strict(&y, "chest", opts(60, 20, 60_000), || async move {
        r.fetch_add(1, Ordering::SeqCst);
    })
    .await;

    match result {
        Err(LockError::Timeout { key, .. }) => assert_eq!(key, "chest"),
        other => panic!("expected Timeout, got {other:?}"),
    }
    assert_eq!(ran.load(Ordering::SeqCst), 0, "fail-closed must not run the section");
}
