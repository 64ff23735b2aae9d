use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use eb_types::{EventBus, ShareAddress, Subscription};
use parking_lot::Mutex;
use tracing::debug;

use crate::document::Document;
use crate::error::{EngineError, EngineResult};
use crate::traits::{Batcher, CacheFactory, CacheOptions, Replica, ReplicaCache};

/// Lifecycle record kept by [`InMemoryCacheFactory`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheEvent {
    Opened(ShareAddress),
    Closed(ShareAddress),
}

#[derive(Default)]
struct Buffer {
    version: u64,
    closed: bool,
    entries: HashMap<String, Option<Document>>,
    order: VecDeque<String>,
}

impl Buffer {
    fn insert(&mut self, path: &str, doc: Option<Document>, max_size: usize) {
        if max_size == 0 {
            return;
        }
        if self.entries.insert(path.to_string(), doc).is_none() {
            self.order.push_back(path.to_string());
        }
        while self.order.len() > max_size {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

/// A bounded read-through cache over any [`Replica`].
///
/// Lookups are buffered up to `max_size` entries, oldest evicted first. Any
/// replica write drops the buffer, bumps the version, and notifies listeners
/// through the configured [`Batcher`].
pub struct InMemoryCache {
    share: ShareAddress,
    replica: Arc<dyn Replica>,
    max_size: usize,
    buffer: Arc<Mutex<Buffer>>,
    updates: Arc<EventBus<()>>,
    replica_sub: Mutex<Option<Subscription>>,
    lifecycle: Option<Arc<Lifecycle>>,
}

impl InMemoryCache {
    pub fn open(replica: Arc<dyn Replica>, options: CacheOptions) -> Self {
        let buffer = Arc::new(Mutex::new(Buffer::default()));
        let updates = Arc::new(EventBus::new());

        let sub = {
            let buffer = Arc::clone(&buffer);
            let updates = Arc::clone(&updates);
            let batcher: Arc<dyn Batcher> = options.batcher;
            replica.on_change(Box::new(move || {
                {
                    let mut buf = buffer.lock();
                    if buf.closed {
                        return;
                    }
                    buf.version += 1;
                    buf.clear();
                }
                batcher.batch(&mut || updates.emit(&()));
            }))
        };

        Self {
            share: replica.share().clone(),
            replica,
            max_size: options.max_size,
            buffer,
            updates,
            replica_sub: Mutex::new(Some(sub)),
            lifecycle: None,
        }
    }

    /// Entries currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.lock().entries.len()
    }

    fn ensure_open(&self) -> EngineResult<()> {
        if self.buffer.lock().closed {
            return Err(EngineError::CacheClosed(self.share.clone()));
        }
        Ok(())
    }
}

impl ReplicaCache for InMemoryCache {
    fn share(&self) -> &ShareAddress {
        &self.share
    }

    fn version(&self) -> u64 {
        self.buffer.lock().version
    }

    fn get_latest(&self, path: &str) -> EngineResult<Option<Document>> {
        self.ensure_open()?;
        if let Some(hit) = self.buffer.lock().entries.get(path) {
            return Ok(hit.clone());
        }
        let doc = self.replica.get_latest(path)?;
        self.buffer.lock().insert(path, doc.clone(), self.max_size);
        Ok(doc)
    }

    fn documents(&self) -> EngineResult<Vec<Document>> {
        self.ensure_open()?;
        self.replica.documents()
    }

    fn on_update(&self, listener: Arc<dyn Fn() + Send + Sync>) -> Subscription {
        self.updates.on(move |_| listener())
    }

    fn close(&self) {
        {
            let mut buf = self.buffer.lock();
            if buf.closed {
                return;
            }
            buf.closed = true;
            buf.clear();
        }
        if let Some(sub) = self.replica_sub.lock().take() {
            sub.cancel();
        }
        if let Some(lifecycle) = &self.lifecycle {
            lifecycle.record_close(&self.share);
        }
        debug!(share = %self.share, "cache closed");
    }

    fn is_closed(&self) -> bool {
        self.buffer.lock().closed
    }
}

#[derive(Default)]
struct Lifecycle {
    live: AtomicUsize,
    log: Mutex<Vec<CacheEvent>>,
}

impl Lifecycle {
    fn record_open(&self, share: &ShareAddress) {
        self.live.fetch_add(1, Ordering::SeqCst);
        self.log.lock().push(CacheEvent::Opened(share.clone()));
    }

    fn record_close(&self, share: &ShareAddress) {
        self.live.fetch_sub(1, Ordering::SeqCst);
        self.log.lock().push(CacheEvent::Closed(share.clone()));
    }
}

/// Opens [`InMemoryCache`]s and records their open/close order.
#[derive(Clone, Default)]
pub struct InMemoryCacheFactory {
    lifecycle: Arc<Lifecycle>,
}

impl InMemoryCacheFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caches opened and not yet closed.
    pub fn live_count(&self) -> usize {
        self.lifecycle.live.load(Ordering::SeqCst)
    }

    /// Every open and close, in order.
    pub fn log(&self) -> Vec<CacheEvent> {
        self.lifecycle.log.lock().clone()
    }
}

impl CacheFactory for InMemoryCacheFactory {
    fn open(
        &self,
        replica: Arc<dyn Replica>,
        options: CacheOptions,
    ) -> EngineResult<Arc<dyn ReplicaCache>> {
        let mut cache = InMemoryCache::open(replica, options);
        self.lifecycle.record_open(&cache.share);
        cache.lifecycle = Some(Arc::clone(&self.lifecycle));
        debug!(share = %cache.share, max_size = cache.max_size, "cache opened");
        Ok(Arc::new(cache))
    }
}
