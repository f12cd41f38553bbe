// ABOUTME: Tests for leader election - single election per lease epoch,
// ABOUTME: observation without renewal, expiry takeover, and contention.

use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::identity::AgentIdentity;
use crate::store::DocStore;

fn setup(dir: &tempfile::TempDir) -> Arc<DocStore<CoordinationDoc>> {
    Arc::new(DocStore::open(dir.path().join("coordination.json")))
}

fn elector(store: &Arc<DocStore<CoordinationDoc>>, name: &str, id: u32) -> LeaderElector {
    LeaderElector::new(Arc::clone(store), AgentIdentity::new(name, id, "worker"))
}

fn resolved(decision: LeaderDecision) -> (LeaderRecord, bool, bool) {
    match decision {
        LeaderDecision::Resolved {
            leader,
            is_leader,
            elected,
        } => (leader, is_leader, elected),
        LeaderDecision::Undecided => panic!("expected a resolution"),
    }
}

#[tokio::test]
async fn test_first_candidate_is_elected() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(&dir);
    let alpha = elector(&store, "alpha", 1);

    let (leader, is_leader, elected) = resolved(alpha.resolve_leader("dig-moat", 60_000).await.unwrap());
    assert!(elected);
    assert!(is_leader);
    assert_eq!(leader.goal, "dig-moat");
    assert_eq!(leader.owner_key, alpha.identity().owner_key);
}

#[tokio::test]
async fn test_at_most_one_election_per_epoch() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(&dir);
    let alpha = elector(&store, "alpha", 1);
    let beta = elector(&store, "beta", 2);

    let (_, _, elected) = resolved(alpha.resolve_leader("dig-moat", 60_000).await.unwrap());
    assert!(elected);

    let (leader, is_leader, elected) = resolved(beta.resolve_leader("dig-moat", 60_000).await.unwrap());
    assert!(!elected, "live leader must be observed, not replaced");
    assert!(!is_leader);
    assert_eq!(leader.owner_key, alpha.identity().owner_key);
}

#[tokio::test]
async fn test_observation_never_renews() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(&dir);
    let alpha = elector(&store, "alpha", 1);

    let (first, _, _) = resolved(alpha.resolve_leader("dig-moat", 60_000).await.unwrap());

    tokio::time::sleep(Duration::from_millis(20)).await;
    let (second, is_leader, elected) = resolved(alpha.resolve_leader("dig-moat", 60_000).await.unwrap());

    assert!(is_leader);
    assert!(!elected);
    assert_eq!(second.expires_at, first.expires_at, "observing must not extend the lease");
}

#[tokio::test]
async fn test_expired_leader_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(&dir);
    let alpha = elector(&store, "alpha", 1);
    let beta = elector(&store, "beta", 2);

    resolved(alpha.resolve_leader("dig-moat", 30).await.unwrap());
    tokio::time::sleep(Duration::from_millis(60)).await;

    let (leader, is_leader, elected) = resolved(beta.resolve_leader("dig-moat", 60_000).await.unwrap());
    assert!(elected, "expired lease must open the seat");
    assert!(is_leader);
    assert_eq!(leader.owner_key, beta.identity().owner_key);
}

#[tokio::test]
async fn test_different_goal_replaces_leader() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(&dir);
    let alpha = elector(&store, "alpha", 1);
    let beta = elector(&store, "beta", 2);

    resolved(alpha.resolve_leader("dig-moat", 60_000).await.unwrap());

    let (leader, _, elected) = resolved(beta.resolve_leader("build-wall", 60_000).await.unwrap());
    assert!(elected, "a leader for another goal does not hold this one");
    assert_eq!(leader.goal, "build-wall");
}

#[tokio::test]
async fn test_contended_mutex_is_undecided() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(&dir);
    let alpha = elector(&store, "alpha", 1);

    // Simulate another process inside its critical section.
    tokio::fs::write(dir.path().join("coordination.json.lock"), b"")
        .await
        .unwrap();

    let decision = alpha.resolve_leader("dig-moat", 60_000).await.unwrap();
    assert_eq!(decision, LeaderDecision::Undecided);
}

#[tokio::test]
async fn test_renew_extends_own_lease_only() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(&dir);
    let alpha = elector(&store, "alpha", 1);
    let beta = elector(&store, "beta", 2);

    let (first, _, _) = resolved(alpha.resolve_leader("dig-moat", 60_000).await.unwrap());

    assert!(!beta.renew("dig-moat", 120_000).await.unwrap(), "non-leader cannot renew");

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(alpha.renew("dig-moat", 120_000).await.unwrap());

    let doc = store.read().await;
    let leader = doc.leader.expect("leader present");
    assert!(leader.expires_at > first.expires_at);
    assert_eq!(leader.owner_key, alpha.identity().owner_key);
}

#[tokio::test]
async fn test_abdicate_frees_the_seat() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(&dir);
    let alpha = elector(&store, "alpha", 1);
    let beta = elector(&store, "beta", 2);

    resolved(alpha.resolve_leader("dig-moat", 60_000).await.unwrap());

    assert!(!beta.abdicate("dig-moat").await.unwrap(), "only the holder can abdicate");
    assert!(alpha.abdicate("dig-moat").await.unwrap());

    let (_, is_leader, elected) = resolved(beta.resolve_leader("dig-moat", 60_000).await.unwrap());
    assert!(elected);
    assert!(is_leader);
}
