//! The engine contract Earthbind consumes.
//!
//! Implementations must be thread-safe (`Send + Sync`). Earthbind itself
//! drives them from a single logical thread of control, but listeners may be
//! invoked from wherever the engine delivers events.

use std::fmt;
use std::sync::Arc;

use eb_types::{ShareAddress, Subscription, SyncServerUrl};

use crate::document::Document;
use crate::error::EngineResult;

/// Default upper bound on entries buffered by a [`ReplicaCache`].
pub const DEFAULT_CACHE_SIZE: usize = 1000;

/// Events published on a peer's wildcard bus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PeerEvent {
    /// A replica was attached to the peer.
    ReplicaAdded(ShareAddress),
    /// A sync channel to a server was opened.
    SyncOpened(SyncServerUrl),
    /// A sync channel to a server was closed.
    SyncClosed(SyncServerUrl),
}

/// A local copy of one share's data.
pub trait Replica: Send + Sync {
    fn share(&self) -> &ShareAddress;

    /// Latest document at `path`, if any.
    fn get_latest(&self, path: &str) -> EngineResult<Option<Document>>;

    /// All latest documents, ordered by path.
    fn documents(&self) -> EngineResult<Vec<Document>>;

    /// Register a listener fired after every write.
    fn on_change(&self, listener: Box<dyn Fn() + Send + Sync>) -> Subscription;
}

/// The local node aggregating replicas.
pub trait Peer: Send + Sync {
    /// Attach a replica. Fails if the share is already attached.
    fn add_replica(&self, replica: Arc<dyn Replica>) -> EngineResult<()>;

    fn get_replica(&self, share: &ShareAddress) -> Option<Arc<dyn Replica>>;

    fn has_share(&self, share: &ShareAddress) -> bool {
        self.get_replica(share).is_some()
    }

    /// Attached shares, ordered.
    fn shares(&self) -> Vec<ShareAddress>;

    /// Open a live sync channel to `server`. Dropping or cancelling the
    /// returned handle closes the channel.
    fn sync(&self, server: &SyncServerUrl) -> Subscription;

    /// Wildcard subscription to every peer event.
    fn on_any(&self, listener: Box<dyn Fn(&PeerEvent) + Send + Sync>) -> Subscription;
}

/// Wraps delivery of cache-update callbacks.
///
/// A view layer passes a batcher that runs `deliver` inside one rendering
/// batch, so a burst of callbacks costs one re-render.
pub trait Batcher: Send + Sync {
    fn batch(&self, deliver: &mut dyn FnMut());
}

/// Runs callbacks directly, with no batching.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateBatcher;

impl Batcher for ImmediateBatcher {
    fn batch(&self, deliver: &mut dyn FnMut()) {
        deliver();
    }
}

/// Construction parameters for a [`ReplicaCache`].
#[derive(Clone)]
pub struct CacheOptions {
    /// Maximum number of buffered entries.
    pub max_size: usize,
    pub batcher: Arc<dyn Batcher>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_CACHE_SIZE,
            batcher: Arc::new(ImmediateBatcher),
        }
    }
}

impl fmt::Debug for CacheOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheOptions")
            .field("max_size", &self.max_size)
            .finish_non_exhaustive()
    }
}

/// A bounded, update-notifying read view over one replica.
///
/// The cache is mutable and read live: callers hold it and re-read after each
/// update notification rather than copying a snapshot.
pub trait ReplicaCache: Send + Sync {
    fn share(&self) -> &ShareAddress;

    /// Bumped on every underlying change.
    fn version(&self) -> u64;

    fn get_latest(&self, path: &str) -> EngineResult<Option<Document>>;

    fn documents(&self) -> EngineResult<Vec<Document>>;

    /// Register a listener fired (through the batcher) after each change.
    fn on_update(&self, listener: Arc<dyn Fn() + Send + Sync>) -> Subscription;

    /// Stop listening to the replica and drop buffered entries. Idempotent.
    fn close(&self);

    fn is_closed(&self) -> bool;
}

/// Opens caches over replicas.
pub trait CacheFactory: Send + Sync {
    fn open(
        &self,
        replica: Arc<dyn Replica>,
        options: CacheOptions,
    ) -> EngineResult<Arc<dyn ReplicaCache>>;
}
