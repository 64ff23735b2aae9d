//! The session store.

use std::sync::Arc;

use eb_types::{Identity, Invalidator, ShareAddress, SyncServerUrl};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::durable::DurableStore;
use crate::error::{SessionError, SessionResult};
use crate::keys::SessionKeys;
use crate::persisted::load_session;

/// The five values that make up a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    /// Signed-in author, or `None` when signed out.
    pub identity: Option<Identity>,
    /// Known sync servers, without duplicates.
    pub sync_servers: Vec<SyncServerUrl>,
    /// Shares attached to the peer, in attach order.
    pub shares: Vec<ShareAddress>,
    /// Selected share as stored. Readers validate it against the peer.
    pub current_share: Option<ShareAddress>,
    pub is_live: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            identity: None,
            sync_servers: Vec::new(),
            shares: Vec::new(),
            current_share: None,
            is_live: true,
        }
    }
}

struct Persistence {
    store: Arc<dyn DurableStore>,
    keys: SessionKeys,
    live_default: bool,
}

impl Persistence {
    fn write<T: Serialize + ?Sized>(&self, key: &str, value: Option<&T>) {
        let result = match value {
            None => self.store.remove(key),
            Some(value) => encode(key, value).and_then(|json| self.store.set(key, &json)),
        };
        if let Err(e) = result {
            warn!(key, error = %e, "could not persist session value");
        }
    }
}

fn encode<T: Serialize + ?Sized>(key: &str, value: &T) -> SessionResult<String> {
    serde_json::to_string(value).map_err(|e| SessionError::Serialization {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Single source of truth for session state.
///
/// Every setter that changes a value bumps the store's [`Invalidator`] and,
/// for a persisted store, writes the new value back to the durable store
/// under the session's key. Setting a value equal to the current one is a
/// no-op. No setter fails: write-back errors are logged and the in-memory
/// value stands.
pub struct SessionStore {
    state: RwLock<SessionState>,
    invalidator: Invalidator,
    persistence: Option<Persistence>,
}

impl SessionStore {
    /// An unpersisted store.
    pub fn new(state: SessionState) -> Self {
        Self {
            state: RwLock::new(state),
            invalidator: Invalidator::new(),
            persistence: None,
        }
    }

    /// A store that writes every change back to `store` under `keys`.
    ///
    /// `live_default` is the live flag [`SessionStore::refresh`] assumes when
    /// the stored flag is missing.
    pub fn persisted(
        state: SessionState,
        store: Arc<dyn DurableStore>,
        keys: SessionKeys,
        live_default: bool,
    ) -> Self {
        Self {
            state: RwLock::new(state),
            invalidator: Invalidator::new(),
            persistence: Some(Persistence {
                store,
                keys,
                live_default,
            }),
        }
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state.read().identity.clone()
    }

    pub fn sync_servers(&self) -> Vec<SyncServerUrl> {
        self.state.read().sync_servers.clone()
    }

    pub fn shares(&self) -> Vec<ShareAddress> {
        self.state.read().shares.clone()
    }

    /// The stored selection, unvalidated.
    pub fn current_share(&self) -> Option<ShareAddress> {
        self.state.read().current_share.clone()
    }

    pub fn is_live(&self) -> bool {
        self.state.read().is_live
    }

    /// A consistent copy of all five values.
    pub fn snapshot(&self) -> SessionState {
        self.state.read().clone()
    }

    /// Sign in (`Some`) or out (`None`).
    pub fn set_identity(&self, identity: Option<Identity>) {
        {
            let mut state = self.state.write();
            if state.identity == identity {
                return;
            }
            state.identity = identity.clone();
        }
        debug!(signed_in = identity.is_some(), "identity changed");
        if let Some(p) = &self.persistence {
            p.write(&p.keys.identity, identity.as_ref());
        }
        self.invalidator.invalidate();
    }

    /// Replace the sync-server list. Duplicates are dropped, first occurrence
    /// wins.
    pub fn set_sync_servers(&self, servers: Vec<SyncServerUrl>) {
        let servers = dedupe(servers);
        {
            let mut state = self.state.write();
            if state.sync_servers == servers {
                return;
            }
            state.sync_servers = servers.clone();
        }
        debug!(count = servers.len(), "sync servers changed");
        if let Some(p) = &self.persistence {
            p.write(&p.keys.replica_servers, Some(&servers));
        }
        self.invalidator.invalidate();
    }

    /// Derive a new sync-server list from the current one.
    pub fn update_sync_servers(&self, f: impl FnOnce(&[SyncServerUrl]) -> Vec<SyncServerUrl>) {
        let next = f(&self.sync_servers());
        self.set_sync_servers(next);
    }

    /// Change the selected share. The value is not checked against the peer
    /// here; selection readers reset unknown shares.
    pub fn set_current_share(&self, share: Option<ShareAddress>) {
        {
            let mut state = self.state.write();
            if state.current_share == share {
                return;
            }
            state.current_share = share.clone();
        }
        debug!(share = ?share, "current share changed");
        if let Some(p) = &self.persistence {
            p.write(&p.keys.current_share, share.as_ref());
        }
        self.invalidator.invalidate();
    }

    pub fn set_live(&self, live: bool) {
        {
            let mut state = self.state.write();
            if state.is_live == live {
                return;
            }
            state.is_live = live;
        }
        debug!(live, "live flag changed");
        if let Some(p) = &self.persistence {
            p.write(&p.keys.is_live, Some(&live));
        }
        self.invalidator.invalidate();
    }

    /// Add `share` to the attached-share list if absent.
    pub fn record_share(&self, share: ShareAddress) {
        let shares = {
            let mut state = self.state.write();
            if state.shares.contains(&share) {
                return;
            }
            state.shares.push(share);
            state.shares.clone()
        };
        if let Some(p) = &self.persistence {
            p.write(&p.keys.shares, Some(&shares));
        }
        self.invalidator.invalidate();
    }

    /// Swap in a whole new state at once. Readers never see a mix of old and
    /// new values; the invalidator is bumped once if anything changed. Nothing
    /// is written back.
    pub fn replace_all(&self, next: SessionState) -> bool {
        {
            let mut state = self.state.write();
            if *state == next {
                return false;
            }
            *state = next;
        }
        self.invalidator.invalidate();
        true
    }

    /// Re-read every value from the durable store and apply it with
    /// [`SessionStore::replace_all`]. Returns whether anything changed. An
    /// unpersisted store never changes.
    pub fn refresh(&self) -> bool {
        let Some(p) = &self.persistence else {
            return false;
        };
        let fresh = load_session(p.store.as_ref(), &p.keys, p.live_default);
        self.replace_all(fresh)
    }

    /// The key scheme this store writes under, if persisted.
    pub fn keys(&self) -> Option<&SessionKeys> {
        self.persistence.as_ref().map(|p| &p.keys)
    }

    pub fn invalidator(&self) -> &Invalidator {
        &self.invalidator
    }

    /// Bumped on every change.
    pub fn revision(&self) -> u64 {
        self.invalidator.revision()
    }

    pub fn watch(&self) -> watch::Receiver<u64> {
        self.invalidator.watch()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SessionState::default())
    }
}

fn dedupe(servers: Vec<SyncServerUrl>) -> Vec<SyncServerUrl> {
    let mut out: Vec<SyncServerUrl> = Vec::with_capacity(servers.len());
    for server in servers {
        if !out.contains(&server) {
            out.push(server);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn url(s: &str) -> SyncServerUrl {
        SyncServerUrl::parse(s).unwrap()
    }

    fn share(s: &str) -> ShareAddress {
        ShareAddress::new(s).unwrap()
    }

    fn persisted() -> (Arc<MemoryStore>, SessionStore, SessionKeys) {
        let store = Arc::new(MemoryStore::standalone());
        let keys = SessionKeys::new("test");
        let session = SessionStore::persisted(
            SessionState::default(),
            store.clone(),
            keys.clone(),
            true,
        );
        (store, session, keys)
    }

    #[test]
    fn defaults() {
        let session = SessionStore::default();
        assert!(session.identity().is_none());
        assert!(session.sync_servers().is_empty());
        assert!(session.shares().is_empty());
        assert!(session.current_share().is_none());
        assert!(session.is_live());
        assert_eq!(session.revision(), 0);
    }

    #[test]
    fn setters_bump_only_on_change() {
        let session = SessionStore::default();
        session.set_live(true);
        assert_eq!(session.revision(), 0);
        session.set_live(false);
        assert_eq!(session.revision(), 1);
        session.set_current_share(Some(share("+a.b")));
        session.set_current_share(Some(share("+a.b")));
        assert_eq!(session.revision(), 2);
    }

    #[test]
    fn sync_servers_are_deduplicated() {
        let session = SessionStore::default();
        session.set_sync_servers(vec![
            url("https://a.example"),
            url("https://b.example"),
            url("https://a.example"),
        ]);
        assert_eq!(
            session.sync_servers(),
            vec![url("https://a.example"), url("https://b.example")]
        );
        session.update_sync_servers(|current| {
            current
                .iter()
                .filter(|s| s.as_str() != "https://a.example")
                .cloned()
                .collect()
        });
        assert_eq!(session.sync_servers(), vec![url("https://b.example")]);
    }

    #[test]
    fn record_share_is_idempotent() {
        let session = SessionStore::default();
        session.record_share(share("+a.b"));
        session.record_share(share("+a.b"));
        assert_eq!(session.shares(), vec![share("+a.b")]);
        assert_eq!(session.revision(), 1);
    }

    #[test]
    fn writes_back_under_namespaced_keys() {
        let (store, session, keys) = persisted();
        session.set_identity(Some(Identity::new("@suzy.abc", "s")));
        session.set_sync_servers(vec![url("https://a.example")]);
        session.record_share(share("+garden.abc"));
        session.set_current_share(Some(share("+garden.abc")));
        session.set_live(false);

        let identity: Identity =
            serde_json::from_str(&store.get(&keys.identity).unwrap().unwrap()).unwrap();
        assert_eq!(identity.address, "@suzy.abc");
        assert_eq!(
            store.get(&keys.replica_servers).unwrap().as_deref(),
            Some(r#"["https://a.example"]"#)
        );
        assert_eq!(
            store.get(&keys.shares).unwrap().as_deref(),
            Some(r#"["+garden.abc"]"#)
        );
        assert_eq!(
            store.get(&keys.current_share).unwrap().as_deref(),
            Some(r#""+garden.abc""#)
        );
        assert_eq!(store.get(&keys.is_live).unwrap().as_deref(), Some("false"));
    }

    #[test]
    fn clearing_removes_the_key() {
        let (store, session, keys) = persisted();
        session.set_identity(Some(Identity::new("@suzy.abc", "s")));
        session.set_identity(None);
        assert_eq!(store.get(&keys.identity).unwrap(), None);
    }

    #[test]
    fn replace_all_is_one_bump() {
        let session = SessionStore::default();
        let next = SessionState {
            identity: Some(Identity::new("@suzy.abc", "s")),
            sync_servers: vec![url("https://a.example")],
            shares: vec![share("+a.b")],
            current_share: Some(share("+a.b")),
            is_live: false,
        };
        assert!(session.replace_all(next.clone()));
        assert_eq!(session.revision(), 1);
        assert_eq!(session.snapshot(), next);
        assert!(!session.replace_all(next));
        assert_eq!(session.revision(), 1);
    }

    #[test]
    fn replace_all_does_not_write_back() {
        let (store, session, keys) = persisted();
        session.replace_all(SessionState {
            is_live: false,
            ..SessionState::default()
        });
        assert_eq!(store.get(&keys.is_live).unwrap(), None);
    }

    #[test]
    fn refresh_reads_the_store() {
        let (store, session, keys) = persisted();
        store.set(&keys.is_live, "false").unwrap();
        assert!(session.refresh());
        assert!(!session.is_live());
        assert!(!session.refresh());
        assert!(!SessionStore::default().refresh());
    }
}
