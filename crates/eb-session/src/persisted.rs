//! Loading a session from a durable store and following external writes.

use std::sync::Arc;

use eb_types::{Identity, ShareAddress, Subscription, SyncServerUrl};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::durable::{DurableStore, StorageEvent};
use crate::error::{SessionError, SessionResult};
use crate::keys::SessionKeys;
use crate::session::{SessionState, SessionStore};

/// Read all five session values from `store`.
///
/// Missing keys take their defaults (no identity, empty lists, no selection,
/// live = `live_default`). A value that cannot be read or decoded is treated
/// as missing and logged.
pub fn load_session(
    store: &dyn DurableStore,
    keys: &SessionKeys,
    live_default: bool,
) -> SessionState {
    SessionState {
        identity: read::<Identity>(store, &keys.identity),
        sync_servers: read_list::<SyncServerUrl>(store, &keys.replica_servers),
        shares: read_list::<ShareAddress>(store, &keys.shares),
        current_share: read::<ShareAddress>(store, &keys.current_share),
        is_live: read::<bool>(store, &keys.is_live).unwrap_or(live_default),
    }
}

fn read<T: DeserializeOwned>(store: &dyn DurableStore, key: &str) -> Option<T> {
    let raw = read_raw(store, key)?;
    match decode(key, &raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(error = %e, "undecodable session value, using default");
            None
        }
    }
}

/// A stored list, keeping every entry that decodes. Bad entries are logged
/// and skipped; a value that is not a list at all reads as empty.
fn read_list<T: DeserializeOwned>(store: &dyn DurableStore, key: &str) -> Vec<T> {
    let Some(raw) = read_raw(store, key) else {
        return Vec::new();
    };
    let entries: Vec<serde_json::Value> = match decode(key, &raw) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "undecodable session list, using empty list");
            return Vec::new();
        }
    };
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, index, error = %e, "skipping undecodable session list entry");
                None
            }
        })
        .collect()
}

fn read_raw(store: &dyn DurableStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(key, error = %e, "could not read session value, using default");
            None
        }
    }
}

fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> SessionResult<T> {
    serde_json::from_str(raw).map_err(|e| SessionError::Serialization {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Keeps a [`SessionStore`] in step with writes made by other instances.
///
/// [`PersistedSessionSync::start`] loads the session, builds a persisted
/// [`SessionStore`] over it, and watches the durable store. When another
/// instance writes one of the session's five keys, all five are re-read and
/// swapped in together. Dropping the sync stops watching.
pub struct PersistedSessionSync {
    keys: SessionKeys,
    _watch: Subscription,
}

impl PersistedSessionSync {
    /// Start with the live flag defaulting to `true`.
    pub fn start(store: Arc<dyn DurableStore>, keys: SessionKeys) -> (Arc<SessionStore>, Self) {
        Self::start_with_live_default(store, keys, true)
    }

    pub fn start_with_live_default(
        store: Arc<dyn DurableStore>,
        keys: SessionKeys,
        live_default: bool,
    ) -> (Arc<SessionStore>, Self) {
        let initial = load_session(store.as_ref(), &keys, live_default);
        debug!(
            shares = initial.shares.len(),
            servers = initial.sync_servers.len(),
            live = initial.is_live,
            "session loaded"
        );
        let session = Arc::new(SessionStore::persisted(
            initial,
            Arc::clone(&store),
            keys.clone(),
            live_default,
        ));

        let weak = Arc::downgrade(&session);
        let watched = keys.clone();
        let watch = store.watch(Box::new(move |event: &StorageEvent| {
            if !watched.contains(&event.key) {
                return;
            }
            let Some(session) = weak.upgrade() else {
                return;
            };
            if session.refresh() {
                debug!(key = %event.key, "session refreshed from external write");
            }
        }));

        (
            session,
            Self {
                keys,
                _watch: watch,
            },
        )
    }

    pub fn keys(&self) -> &SessionKeys {
        &self.keys
    }
}
