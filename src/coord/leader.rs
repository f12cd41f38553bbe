// ABOUTME: Leader election over the coordination document.
// ABOUTME: At most one live leader per goal within one lease epoch.

use std::sync::Arc;

use super::document::{CoordinationDoc, LeaderRecord};
use crate::error::StoreError;
use crate::identity::AgentIdentity;
use crate::store::DocStore;
use crate::time::epoch_ms;

/// Outcome of one leader resolution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaderDecision {
    /// The document mutex was contended; no decision this tick.
    Undecided,

    /// A leader is recognized for the goal.
    Resolved {
        /// The recognized leader record.
        leader: LeaderRecord,
        /// Whether the caller is that leader.
        is_leader: bool,
        /// Whether this call performed the election (wrote a fresh record).
        elected: bool,
    },
}

/// Elects or observes exactly one live leader per goal.
///
/// Because read-decide-write is serialized by the document mutex, at most one
/// process observes `elected: true` for a goal within one lease epoch. If the
/// leader fails to renew before its lease ends, a different candidate may be
/// elected mid-task; leadership-dependent actions must therefore be
/// idempotent.
pub struct LeaderElector {
    store: Arc<DocStore<CoordinationDoc>>,
    identity: AgentIdentity,
}

impl LeaderElector {
    /// Create an elector for one identity over one coordination domain.
    pub fn new(store: Arc<DocStore<CoordinationDoc>>, identity: AgentIdentity) -> Self {
        Self { store, identity }
    }

    /// The identity this elector represents.
    pub fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    /// Resolve who leads `goal`, electing the caller if the seat is open.
    ///
    /// Single non-blocking mutex attempt: returns [`LeaderDecision::Undecided`]
    /// on contention, and callers retry on a later tick rather than spinning
    /// here. Observing an existing live leader performs no write - renewal is
    /// only ever done by the explicit [`LeaderElector::renew`] call.
    pub async fn resolve_leader(
        &self,
        goal: &str,
        ttl_ms: u64,
    ) -> Result<LeaderDecision, StoreError> {
        let decision = self
            .store
            .with_lock(|| async move {
                let mut doc = self.store.read().await;
                let now = epoch_ms();

                if let Some(existing) = &doc.leader {
                    if existing.is_live(now) && existing.goal == goal {
                        return Ok(LeaderDecision::Resolved {
                            is_leader: existing.owner_key == self.identity.owner_key,
                            leader: existing.clone(),
                            elected: false,
                        });
                    }
                }

                let record = LeaderRecord {
                    goal: goal.to_string(),
                    owner_key: self.identity.owner_key.clone(),
                    role: self.identity.role.clone(),
                    agent_id: self.identity.agent_id,
                    elected_at: now,
                    expires_at: now + ttl_ms,
                };
                doc.leader = Some(record.clone());
                self.store.write(&mut doc).await?;

                tracing::debug!(goal, owner = %record.owner_key, "elected leader");
                Ok(LeaderDecision::Resolved {
                    leader: record,
                    is_leader: true,
                    elected: true,
                })
            })
            .await?;

        Ok(decision.unwrap_or(LeaderDecision::Undecided))
    }

    /// Extend the caller's lease on `goal`.
    ///
    /// Returns `true` only when the live leader for `goal` is this identity
    /// and the lease was extended. Contention and not-being-leader both read
    /// as `false`; callers renew again on the next tick.
    pub async fn renew(&self, goal: &str, ttl_ms: u64) -> Result<bool, StoreError> {
        let renewed = self
            .store
            .with_lock(|| async move {
                let mut doc = self.store.read().await;
                let now = epoch_ms();

                let renewable = doc.leader.as_ref().is_some_and(|leader| {
                    leader.is_live(now)
                        && leader.goal == goal
                        && leader.owner_key == self.identity.owner_key
                });
                if !renewable {
                    return Ok(false);
                }

                if let Some(leader) = doc.leader.as_mut() {
                    leader.expires_at = now + ttl_ms;
                }
                self.store.write(&mut doc).await?;
                Ok(true)
            })
            .await?;

        Ok(renewed.unwrap_or(false))
    }

    /// Step down from `goal` if this identity holds the seat.
    ///
    /// Lets a finishing leader free the seat immediately instead of making
    /// the next candidate wait out the lease.
    pub async fn abdicate(&self, goal: &str) -> Result<bool, StoreError> {
        let cleared = self
            .store
            .with_lock(|| async move {
                let mut doc = self.store.read().await;

                let ours = doc
                    .leader
                    .as_ref()
                    .is_some_and(|leader| {
                        leader.goal == goal && leader.owner_key == self.identity.owner_key
                    });
                if !ours {
                    return Ok(false);
                }

                doc.leader = None;
                self.store.write(&mut doc).await?;
                tracing::debug!(goal, owner = %self.identity.owner_key, "abdicated");
                Ok(true)
            })
            .await?;

        Ok(cleared.unwrap_or(false))
    }
}
