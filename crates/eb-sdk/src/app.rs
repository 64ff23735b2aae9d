use std::sync::Arc;

use eb_cache::ReplicaCacheBinding;
use eb_engine::{CacheFactory, InMemoryCacheFactory, InMemoryPeer, Peer, ReplicaCache};
use eb_invite::Invitation;
use eb_peer::{memory_replicas, AddShare, PeerContainer, ReplicaFactory};
use eb_session::{DurableStore, PersistedSessionSync, SessionStore};
use eb_sync::{LiveSyncManager, SyncDelta};
use eb_types::{identity_label, Identity, ShareAddress, SyncServerUrl};
use tracing::info;

use crate::config::AppConfig;
use crate::error::SdkResult;

/// What one [`Earthbind::tick`] did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub sync: SyncDelta,
    /// Share of the bound cache after the tick.
    pub cache_share: Option<ShareAddress>,
}

/// Application root.
///
/// Construction order: the session is loaded from the durable store, the
/// peer container attaches the session's shares, the live sync manager opens
/// channels for the session's servers, and the cache binding starts empty.
/// Dropping the root closes every channel and cache it opened and stops
/// watching the store.
pub struct Earthbind {
    config: AppConfig,
    session: Arc<SessionStore>,
    container: Arc<PeerContainer>,
    live_sync: LiveSyncManager,
    cache: ReplicaCacheBinding,
    _persisted: PersistedSessionSync,
}

impl Earthbind {
    pub fn open(
        config: AppConfig,
        store: Arc<dyn DurableStore>,
        peer: Arc<dyn Peer>,
        replicas: ReplicaFactory,
        caches: Arc<dyn CacheFactory>,
    ) -> Self {
        let (session, persisted) =
            PersistedSessionSync::start_with_live_default(store, config.keys(), config.init_live);
        let container = Arc::new(PeerContainer::new(
            Arc::clone(&peer),
            replicas,
            Arc::clone(&session),
        ));
        let live_sync = LiveSyncManager::new(peer, Arc::clone(&session));
        let cache = ReplicaCacheBinding::with_max_size(
            Arc::clone(&container),
            caches,
            config.cache_max_size,
        );
        info!(namespace = %config.namespace, "earthbind opened");
        Self {
            config,
            session,
            container,
            live_sync,
            cache,
            _persisted: persisted,
        }
    }

    /// A root over the in-memory engine.
    pub fn in_memory(config: AppConfig, store: Arc<dyn DurableStore>) -> Self {
        Self::open(
            config,
            store,
            Arc::new(InMemoryPeer::new()),
            memory_replicas(),
            Arc::new(InMemoryCacheFactory::new()),
        )
    }

    /// One reconciliation pass: bring the peer's shares, sync channels and
    /// the cache binding in line with the current session.
    pub fn tick(&mut self) -> SdkResult<TickReport> {
        self.container.attach_missing();
        let sync = self.live_sync.tick();
        self.cache.follow_selection()?;
        Ok(TickReport {
            sync,
            cache_share: self.cache.share().cloned(),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn container(&self) -> &Arc<PeerContainer> {
        &self.container
    }

    pub fn peer(&self) -> &dyn Peer {
        self.container.peer()
    }

    pub fn live_sync(&self) -> &LiveSyncManager {
        &self.live_sync
    }

    pub fn cache_binding(&mut self) -> &mut ReplicaCacheBinding {
        &mut self.cache
    }

    /// The cache for the current selection, as of the last tick.
    pub fn cache(&self) -> Option<Arc<dyn ReplicaCache>> {
        self.cache.cache()
    }

    /// Current (session, peer, cache) revisions. The view re-reads when any
    /// of them moves.
    pub fn revision(&self) -> (u64, u64, u64) {
        (
            self.session.revision(),
            self.container.notifier().revision(),
            self.cache.revision(),
        )
    }

    pub fn sign_in(&self, identity: Identity) {
        self.session.set_identity(Some(identity));
    }

    pub fn sign_out(&self) {
        self.session.set_identity(None);
    }

    pub fn identity_label(&self) -> String {
        identity_label(self.session.identity().as_ref())
    }

    pub fn add_share(&self, share: &ShareAddress) -> AddShare {
        self.container.add_share(share)
    }

    /// The selected share, validated against the peer.
    pub fn current_share(&self) -> Option<ShareAddress> {
        self.container.current_share()
    }

    pub fn select_share(&self, share: Option<ShareAddress>) {
        self.session.set_current_share(share);
    }

    pub fn set_live(&self, live: bool) {
        self.session.set_live(live);
    }

    pub fn add_sync_server(&self, server: SyncServerUrl) {
        self.session.update_sync_servers(|current| {
            let mut next = current.to_vec();
            next.push(server);
            next
        });
    }

    pub fn remove_sync_server(&self, server: &SyncServerUrl) {
        self.session.update_sync_servers(|current| {
            current.iter().filter(|s| *s != server).cloned().collect()
        });
    }

    /// Decode an invitation without redeeming it.
    pub fn decode_invitation(&self, invitation: &str) -> SdkResult<Invitation> {
        Ok(eb_invite::decode(invitation)?)
    }

    /// Decode and redeem an invitation.
    pub fn redeem(&self, invitation: &str, excluded: &[SyncServerUrl]) -> SdkResult<AddShare> {
        let invitation = eb_invite::decode(invitation)?;
        Ok(invitation.redeem(&self.container, excluded))
    }

    /// Invitation to `share` (or the current selection) carrying the known
    /// servers listed in `included`.
    pub fn make_invitation(
        &self,
        included: &[SyncServerUrl],
        share: Option<&ShareAddress>,
    ) -> SdkResult<String> {
        Ok(eb_invite::make_invitation(&self.session, included, share)?)
    }
}
