//! In-memory durable store shared by several instances.
//!
//! [`MemoryBackend`] holds the data. Each instance gets its own
//! [`MemoryStore`] handle from [`MemoryBackend::handle`]; writes through one
//! handle are announced to watchers on every other handle.

use std::collections::BTreeMap;
use std::sync::Arc;

use eb_types::{EventBus, Subscription};
use parking_lot::RwLock;

use crate::durable::{DurableStore, InstanceId, StorageEvent};
use crate::error::SessionResult;

/// Shared storage behind any number of [`MemoryStore`] handles.
pub struct MemoryBackend {
    data: RwLock<BTreeMap<String, String>>,
    bus: EventBus<(InstanceId, StorageEvent)>,
}

impl MemoryBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            data: RwLock::new(BTreeMap::new()),
            bus: EventBus::new(),
        })
    }

    /// A new handle with its own instance identity.
    pub fn handle(self: &Arc<Self>) -> MemoryStore {
        MemoryStore {
            backend: Arc::clone(self),
            origin: InstanceId::new(),
        }
    }

    /// Number of keys stored.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    fn publish(&self, origin: InstanceId, key: &str, value: Option<String>) {
        self.bus.emit(&(
            origin,
            StorageEvent {
                key: key.to_string(),
                value,
            },
        ));
    }
}

/// One instance's handle on a [`MemoryBackend`].
#[derive(Clone)]
pub struct MemoryStore {
    backend: Arc<MemoryBackend>,
    origin: InstanceId,
}

impl MemoryStore {
    /// A standalone store with no other instances.
    pub fn standalone() -> Self {
        MemoryBackend::new().handle()
    }

    pub fn origin(&self) -> InstanceId {
        self.origin
    }
}

impl DurableStore for MemoryStore {
    fn get(&self, key: &str) -> SessionResult<Option<String>> {
        Ok(self.backend.data.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> SessionResult<()> {
        self.backend
            .data
            .write()
            .insert(key.to_string(), value.to_string());
        self.backend.publish(self.origin, key, Some(value.to_string()));
        Ok(())
    }

    fn remove(&self, key: &str) -> SessionResult<()> {
        let existed = self.backend.data.write().remove(key).is_some();
        if existed {
            self.backend.publish(self.origin, key, None);
        }
        Ok(())
    }

    fn watch(&self, listener: Box<dyn Fn(&StorageEvent) + Send + Sync>) -> Subscription {
        let me = self.origin;
        self.backend.bus.on(move |entry| {
            let (origin, event) = entry;
            if *origin != me {
                listener(event);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn set_get_remove() {
        let store = MemoryStore::standalone();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".into()));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
        store.remove("k").unwrap();
    }

    #[test]
    fn handles_share_data() {
        let backend = MemoryBackend::new();
        let a = backend.handle();
        let b = backend.handle();
        a.set("k", "from-a").unwrap();
        assert_eq!(b.get("k").unwrap(), Some("from-a".into()));
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn watchers_only_hear_other_instances() {
        let backend = MemoryBackend::new();
        let a = backend.handle();
        let b = backend.handle();

        let heard_by_a = Arc::new(Mutex::new(Vec::new()));
        let sink = heard_by_a.clone();
        let _sub = a.watch(Box::new(move |event: &StorageEvent| {
            sink.lock().push(event.clone())
        }));

        a.set("own", "1").unwrap();
        b.set("theirs", "2").unwrap();
        b.remove("theirs").unwrap();

        let heard = heard_by_a.lock().clone();
        assert_eq!(
            heard,
            vec![
                StorageEvent { key: "theirs".into(), value: Some("2".into()) },
                StorageEvent { key: "theirs".into(), value: None },
            ]
        );
    }

    #[test]
    fn watch_released_on_drop() {
        let backend = MemoryBackend::new();
        let a = backend.handle();
        let b = backend.handle();
        let count = Arc::new(Mutex::new(0));
        let c = count.clone();
        let sub = a.watch(Box::new(move |_| *c.lock() += 1));
        b.set("k", "1").unwrap();
        drop(sub);
        b.set("k", "2").unwrap();
        assert_eq!(*count.lock(), 1);
    }
}
