//! In-memory engine.
//!
//! Implements the full engine contract with data held in process memory. It
//! also records sync and cache lifecycles, which makes it the reference
//! collaborator for Earthbind's tests.

pub mod cache;
pub mod peer;
pub mod replica;

pub use cache::{CacheEvent, InMemoryCache, InMemoryCacheFactory};
pub use peer::{InMemoryPeer, SyncOp};
pub use replica::InMemoryReplica;
