// ABOUTME: Coordination module - leases over a shared document.
// ABOUTME: Contains leader election and per-resource mutual exclusion.

mod document;
mod leader;
mod resource;

pub use document::{CoordinationDoc, LeaderRecord, LockRecord};
pub use leader::{LeaderDecision, LeaderElector};
pub use resource::{
    AcquireOptions, ResourceLockManager, with_resource_lock, with_resource_lock_strict,
};

#[cfg(test)]
mod leader_test;
#[cfg(test)]
mod resource_test;
