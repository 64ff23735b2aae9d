//! The [`DurableStore`] contract.
//!
//! A durable store is a string key-value map shared by every instance of an
//! application (separate windows, processes, or tabs). Each instance talks to
//! it through its own handle. Listeners registered with
//! [`DurableStore::watch`] hear about writes made by *other* instances only;
//! an instance already knows what it wrote itself.

use std::fmt;

use eb_types::Subscription;
use uuid::Uuid;

use crate::error::SessionResult;

/// Identity of one application instance's handle on a store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(Uuid);

impl InstanceId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceId({})", self.0)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An externally originated change to one key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    /// New value, or `None` if the key was removed.
    pub value: Option<String>,
}

/// String key-value storage with change notification.
pub trait DurableStore: Send + Sync {
    /// Read a value. `Ok(None)` if the key is absent.
    fn get(&self, key: &str) -> SessionResult<Option<String>>;

    /// Create or overwrite a value.
    fn set(&self, key: &str, value: &str) -> SessionResult<()>;

    /// Remove a key. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> SessionResult<()>;

    /// Listen for writes made through other handles.
    fn watch(&self, listener: Box<dyn Fn(&StorageEvent) + Send + Sync>) -> Subscription;
}
