//! Change signalling between Earthbind components and the view layer.
//!
//! Two primitives:
//!
//! - [`Subscription`] is the release half of every registration (sync channel,
//!   event listener, storage listener, cache listener). It cancels exactly
//!   once, either explicitly or when dropped.
//! - [`Invalidator`] is a revision counter. Components bump it when the view
//!   must re-read; the view compares revisions on each tick or awaits a
//!   [`tokio::sync::watch`] receiver.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

type Cancel = Box<dyn FnOnce() + Send + Sync>;

/// Scoped cancel handle for a live registration.
///
/// The cancel closure runs exactly once: on [`Subscription::cancel`] or on
/// drop, whichever comes first.
#[must_use = "dropping a Subscription cancels it immediately"]
pub struct Subscription {
    cancel: Option<Cancel>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A handle with nothing to release.
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    /// Release now.
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[derive(Debug, Default)]
struct BatchState {
    depth: usize,
    pending: bool,
}

#[derive(Debug)]
struct Inner {
    revision: watch::Sender<u64>,
    batch: Mutex<BatchState>,
}

/// Revision counter telling the view layer to re-read derived state.
///
/// Clones share one counter. Inside [`Invalidator::batch`] any number of
/// [`Invalidator::invalidate`] calls collapse into a single bump when the
/// outermost batch ends.
#[derive(Clone, Debug)]
pub struct Invalidator {
    inner: Arc<Inner>,
}

impl Invalidator {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                revision,
                batch: Mutex::new(BatchState::default()),
            }),
        }
    }

    /// Current revision. Starts at 0 and only grows.
    pub fn revision(&self) -> u64 {
        *self.inner.revision.borrow()
    }

    /// Receiver that observes every bump.
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    /// Mark derived state stale.
    pub fn invalidate(&self) {
        {
            let mut batch = self.inner.batch.lock();
            if batch.depth > 0 {
                batch.pending = true;
                return;
            }
        }
        self.bump();
    }

    /// Run `f`, deferring invalidations until the outermost batch completes.
    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> R {
        self.inner.batch.lock().depth += 1;
        let _guard = BatchGuard { invalidator: self };
        f()
    }

    fn bump(&self) {
        self.inner.revision.send_modify(|rev| *rev += 1);
    }
}

impl Default for Invalidator {
    fn default() -> Self {
        Self::new()
    }
}

struct BatchGuard<'a> {
    invalidator: &'a Invalidator,
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        let flush = {
            let mut batch = self.invalidator.inner.batch.lock();
            batch.depth -= 1;
            batch.depth == 0 && std::mem::take(&mut batch.pending)
        };
        if flush {
            self.invalidator.bump();
        }
    }
}
