// ABOUTME: Root module for cohort - filesystem-backed agent coordination.
// ABOUTME: Re-exports all public types from submodules.

pub mod coord;
pub mod error;
pub mod executor;
pub mod identity;
pub mod plan;
pub mod prelude;
pub mod store;
pub mod time;

pub use error::CohortError;
