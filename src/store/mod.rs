// ABOUTME: Store module - atomic read-modify-write of shared JSON documents.
// ABOUTME: Contains the mutex abstraction and the generic document store.

mod doc_store;
mod mutex;

pub use doc_store::{DocStore, Prune};
pub use mutex::{DocMutex, FileMutex};
