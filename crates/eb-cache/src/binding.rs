use std::sync::Arc;

use eb_engine::{CacheFactory, CacheOptions, ReplicaCache, DEFAULT_CACHE_SIZE};
use eb_peer::PeerContainer;
use eb_types::{Invalidator, ShareAddress, Subscription};
use tokio::sync::watch;
use tracing::{debug, error};

use crate::batcher::InvalidatorBatcher;
use crate::error::{CacheError, CacheResult};

struct ActiveCache {
    share: ShareAddress,
    cache: Arc<dyn ReplicaCache>,
    updates: Subscription,
}

impl ActiveCache {
    /// Unsubscribe first, then close.
    fn teardown(self) {
        let Self {
            share,
            cache,
            updates,
        } = self;
        updates.cancel();
        cache.close();
        debug!(share = %share, "cache binding released");
    }
}

/// Owns the one open cache for the share being viewed.
///
/// [`ReplicaCacheBinding::bind`] resolves a share (an explicit address wins
/// over the session selection), opens a bounded cache over its replica, and
/// subscribes to its updates. Binding a different share first unsubscribes
/// and closes the current cache, so two caches are never open at once.
/// Every cache update and every rebind bumps the binding's revision.
pub struct ReplicaCacheBinding {
    container: Arc<PeerContainer>,
    factory: Arc<dyn CacheFactory>,
    max_size: usize,
    invalidator: Invalidator,
    active: Option<ActiveCache>,
}

impl ReplicaCacheBinding {
    pub fn new(container: Arc<PeerContainer>, factory: Arc<dyn CacheFactory>) -> Self {
        Self::with_max_size(container, factory, DEFAULT_CACHE_SIZE)
    }

    pub fn with_max_size(
        container: Arc<PeerContainer>,
        factory: Arc<dyn CacheFactory>,
        max_size: usize,
    ) -> Self {
        Self {
            container,
            factory,
            max_size,
            invalidator: Invalidator::new(),
            active: None,
        }
    }

    /// Open (or keep) the cache for `explicit`, or for the session selection
    /// when `explicit` is `None`.
    ///
    /// Fails when no share resolves or the peer holds no replica for it.
    /// Both mean the binding was used without a valid selection.
    pub fn bind(
        &mut self,
        explicit: Option<&ShareAddress>,
    ) -> CacheResult<Arc<dyn ReplicaCache>> {
        let share = match explicit {
            Some(share) => share.clone(),
            None => self.container.current_share().ok_or_else(|| {
                error!("cache binding used with no share selected");
                CacheError::NoSelection
            })?,
        };

        if let Some(active) = &self.active {
            if active.share == share && !active.cache.is_closed() {
                return Ok(Arc::clone(&active.cache));
            }
        }

        let replica = self.container.peer().get_replica(&share).ok_or_else(|| {
            error!(share = %share, "cache binding used for a share the peer does not hold");
            CacheError::NoSuchShare(share.clone())
        })?;

        self.release();

        let options = CacheOptions {
            max_size: self.max_size,
            batcher: Arc::new(InvalidatorBatcher::new(self.invalidator.clone())),
        };
        let cache = self.factory.open(replica, options)?;
        let bump = self.invalidator.clone();
        let updates = cache.on_update(Arc::new(move || bump.invalidate()));
        debug!(share = %share, max_size = self.max_size, "cache bound");

        self.active = Some(ActiveCache {
            share,
            cache: Arc::clone(&cache),
            updates,
        });
        self.invalidator.invalidate();
        Ok(cache)
    }

    /// Follow the session selection: bind it if there is one, release the
    /// current cache if there is not.
    pub fn follow_selection(&mut self) -> CacheResult<Option<Arc<dyn ReplicaCache>>> {
        if self.container.current_share().is_none() {
            if self.active.is_some() {
                self.release();
                self.invalidator.invalidate();
            }
            return Ok(None);
        }
        self.bind(None).map(Some)
    }

    /// The open cache, if any.
    pub fn cache(&self) -> Option<Arc<dyn ReplicaCache>> {
        self.active.as_ref().map(|a| Arc::clone(&a.cache))
    }

    /// Share of the open cache.
    pub fn share(&self) -> Option<&ShareAddress> {
        self.active.as_ref().map(|a| &a.share)
    }

    /// Unsubscribe from and close the open cache, if any.
    pub fn release(&mut self) {
        if let Some(active) = self.active.take() {
            active.teardown();
        }
    }

    pub fn revision(&self) -> u64 {
        self.invalidator.revision()
    }

    pub fn watch(&self) -> watch::Receiver<u64> {
        self.invalidator.watch()
    }

    /// Run `f` with cache deliveries coalesced into one revision bump.
    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> R {
        self.invalidator.batch(f)
    }
}

impl Drop for ReplicaCacheBinding {
    fn drop(&mut self) {
        self.release();
    }
}
