//! Fan-out listener registry.
//!
//! Listeners are registered with [`EventBus::on`] and released through the
//! returned [`Subscription`]. Delivery snapshots the listener set first, so a
//! listener may subscribe or unsubscribe from inside its own callback.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::signal::Subscription;

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Registry<E> {
    next_id: u64,
    listeners: BTreeMap<u64, Listener<E>>,
}

/// Wildcard event bus: every listener sees every event.
pub struct EventBus<E> {
    registry: Arc<Mutex<Registry<E>>>,
}

impl<E: 'static> EventBus<E> {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                listeners: BTreeMap::new(),
            })),
        }
    }

    /// Register `listener` for all events.
    pub fn on(&self, listener: impl Fn(&E) + Send + Sync + 'static) -> Subscription {
        let id = {
            let mut reg = self.registry.lock();
            let id = reg.next_id;
            reg.next_id += 1;
            reg.listeners.insert(id, Arc::new(listener));
            id
        };
        let weak: Weak<Mutex<Registry<E>>> = Arc::downgrade(&self.registry);
        Subscription::new(move || {
            if let Some(registry) = weak.upgrade() {
                registry.lock().listeners.remove(&id);
            }
        })
    }

    /// Deliver `event` to every listener registered at call time.
    pub fn emit(&self, event: &E) {
        let listeners: Vec<Listener<E>> =
            self.registry.lock().listeners.values().cloned().collect();
        for listener in listeners {
            listener(event);
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.registry.lock().listeners.len()
    }
}

impl<E: 'static> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}
