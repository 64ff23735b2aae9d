//! Replication-engine interface for Earthbind.
//!
//! Earthbind does not replicate data itself. It drives an engine through the
//! traits in [`traits`]: a [`Peer`] owning [`Replica`]s, live sync channels to
//! remote servers, a wildcard event bus, and bounded [`ReplicaCache`]s.
//!
//! # Modules
//!
//! - [`error`] -- [`EngineError`] and the `is_*` kind predicates
//! - [`traits`] -- The engine contract
//! - [`validation`] -- [`check_share_is_valid`]
//! - [`keypair`] -- Author identity generation
//! - [`memory`] -- In-memory engine for tests, demos, and the CLI

pub mod document;
pub mod error;
pub mod keypair;
pub mod memory;
pub mod traits;
pub mod validation;

pub use document::Document;
pub use error::{EngineError, EngineResult};
pub use keypair::generate_identity;
pub use memory::{
    CacheEvent, InMemoryCache, InMemoryCacheFactory, InMemoryPeer, InMemoryReplica, SyncOp,
};
pub use traits::{
    Batcher, CacheFactory, CacheOptions, ImmediateBatcher, Peer, PeerEvent, Replica, ReplicaCache,
    DEFAULT_CACHE_SIZE,
};
pub use validation::check_share_is_valid;
