use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::Arc;

use eb_engine::Peer;
use eb_session::SessionStore;
use eb_types::{Subscription, SyncServerUrl};
use tracing::debug;

/// What one reconciliation pass changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncDelta {
    pub opened: Vec<SyncServerUrl>,
    pub closed: Vec<SyncServerUrl>,
}

impl SyncDelta {
    pub fn is_empty(&self) -> bool {
        self.opened.is_empty() && self.closed.is_empty()
    }
}

/// Keeps one sync channel open per known server while the session is live.
///
/// Each URL moves independently between idle and subscribed: adding a server
/// opens only its channel, removing one closes only its channel, and turning
/// the live flag off closes them all. Every channel opened is cancelled
/// exactly once, at the latest when the manager is dropped.
pub struct LiveSyncManager {
    peer: Arc<dyn Peer>,
    session: Arc<SessionStore>,
    channels: BTreeMap<SyncServerUrl, Subscription>,
    seen_revision: Option<u64>,
}

impl LiveSyncManager {
    /// Build a manager and bring it in line with the current session.
    pub fn new(peer: Arc<dyn Peer>, session: Arc<SessionStore>) -> Self {
        let mut manager = Self {
            peer,
            session,
            channels: BTreeMap::new(),
            seen_revision: None,
        };
        manager.tick();
        manager
    }

    /// Reconcile if the session changed since the last pass.
    pub fn tick(&mut self) -> SyncDelta {
        let revision = self.session.revision();
        if self.seen_revision == Some(revision) {
            return SyncDelta::default();
        }
        self.seen_revision = Some(revision);
        let state = self.session.snapshot();
        self.reconcile(state.is_live, &state.sync_servers)
    }

    /// Make the open channels match `servers` if `live`, or nothing if not.
    ///
    /// Stale channels are closed before new ones are opened.
    pub fn reconcile(&mut self, live: bool, servers: &[SyncServerUrl]) -> SyncDelta {
        let desired: BTreeSet<&SyncServerUrl> = if live {
            servers.iter().collect()
        } else {
            BTreeSet::new()
        };

        let stale: Vec<SyncServerUrl> = self
            .channels
            .keys()
            .filter(|url| !desired.contains(url))
            .cloned()
            .collect();
        for url in &stale {
            if let Some(channel) = self.channels.remove(url) {
                channel.cancel();
                debug!(url = %url, "sync subscription closed");
            }
        }

        let mut opened = Vec::new();
        for url in desired {
            if self.channels.contains_key(url) {
                continue;
            }
            let channel = self.peer.sync(url);
            self.channels.insert(url.clone(), channel);
            debug!(url = %url, "sync subscription opened");
            opened.push(url.clone());
        }

        SyncDelta {
            opened,
            closed: stale,
        }
    }

    /// Servers with an open channel.
    pub fn open_servers(&self) -> Vec<SyncServerUrl> {
        self.channels.keys().cloned().collect()
    }

    pub fn is_open(&self, url: &SyncServerUrl) -> bool {
        self.channels.contains_key(url)
    }

    /// Close every channel. The next [`LiveSyncManager::tick`] after a
    /// session change reopens what the session asks for.
    pub fn close_all(&mut self) -> Vec<SyncServerUrl> {
        let closed: Vec<SyncServerUrl> = self.channels.keys().cloned().collect();
        for (url, channel) in std::mem::take(&mut self.channels) {
            channel.cancel();
            debug!(url = %url, "sync subscription closed");
        }
        self.seen_revision = None;
        closed
    }

    /// Reconcile on every session change until `stop` completes or the
    /// session's revision channel closes.
    pub async fn follow(&mut self, stop: impl Future<Output = ()>) {
        let mut changes = self.session.watch();
        tokio::pin!(stop);
        loop {
            self.tick();
            tokio::select! {
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = &mut stop => break,
            }
        }
    }
}

impl Drop for LiveSyncManager {
    fn drop(&mut self) {
        self.close_all();
    }
}
