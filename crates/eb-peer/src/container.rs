//! The application's one peer.

use std::sync::Arc;

use eb_engine::{EngineError, EngineResult, InMemoryReplica, Peer, Replica};
use eb_session::SessionStore;
use eb_types::ShareAddress;
use tracing::{info, warn};

use crate::error::{PeerError, PeerResult};
use crate::notifier::PeerChangeNotifier;

/// Builds a replica for a share address.
pub type ReplicaFactory =
    Arc<dyn Fn(&ShareAddress) -> EngineResult<Arc<dyn Replica>> + Send + Sync>;

/// A factory producing empty [`InMemoryReplica`]s.
pub fn memory_replicas() -> ReplicaFactory {
    Arc::new(|share: &ShareAddress| -> EngineResult<Arc<dyn Replica>> {
        Ok(Arc::new(InMemoryReplica::new(share.clone())?))
    })
}

/// Result of [`PeerContainer::add_share`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddShare {
    /// A new replica was attached and recorded in the session.
    Attached,
    /// The peer already held the share; nothing changed.
    AlreadyAttached,
    /// Attachment failed. The peer and session are unchanged.
    Failed(PeerError),
}

impl AddShare {
    /// Whether the peer holds the share afterwards.
    pub fn is_attached(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// Owns the engine peer for the lifetime of one application instance.
///
/// Built once. On construction every share already listed in the session is
/// attached through the factory; shares that fail are logged and skipped.
pub struct PeerContainer {
    peer: Arc<dyn Peer>,
    factory: ReplicaFactory,
    session: Arc<SessionStore>,
    notifier: PeerChangeNotifier,
}

impl PeerContainer {
    pub fn new(peer: Arc<dyn Peer>, factory: ReplicaFactory, session: Arc<SessionStore>) -> Self {
        let notifier = PeerChangeNotifier::new(peer.as_ref());
        let container = Self {
            peer,
            factory,
            session,
            notifier,
        };
        container.attach_missing();
        container
    }

    /// Attach every share the session lists that the peer does not hold yet.
    ///
    /// Shares reach the session from other instances through the durable
    /// store; this brings the peer up to date with them. Failures are logged
    /// and skipped. Returns the shares newly attached.
    pub fn attach_missing(&self) -> Vec<ShareAddress> {
        let mut attached = Vec::new();
        for share in self.session.shares() {
            if self.peer.has_share(&share) {
                continue;
            }
            match self.attach(&share) {
                Ok(()) => {
                    info!(share = %share, "stored share attached");
                    attached.push(share);
                }
                Err(e) => warn!(share = %share, error = %e, "could not attach stored share"),
            }
        }
        attached
    }

    /// The peer, read-only. Shares are attached through
    /// [`PeerContainer::add_share`].
    pub fn peer(&self) -> &dyn Peer {
        self.peer.as_ref()
    }

    /// A shared handle on the peer.
    pub fn peer_handle(&self) -> Arc<dyn Peer> {
        Arc::clone(&self.peer)
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn notifier(&self) -> &PeerChangeNotifier {
        &self.notifier
    }

    pub fn has_share(&self, share: &ShareAddress) -> bool {
        self.peer.has_share(share)
    }

    /// Attach `share` to the peer and record it in the session.
    ///
    /// Safe to retry. Failures are logged and reported in the outcome; they
    /// never touch the session.
    pub fn add_share(&self, share: &ShareAddress) -> AddShare {
        if self.peer.has_share(share) {
            self.session.record_share(share.clone());
            return AddShare::AlreadyAttached;
        }
        match self.attach(share) {
            Ok(()) => {
                self.session.record_share(share.clone());
                info!(share = %share, "share attached");
                AddShare::Attached
            }
            Err(PeerError::Attach {
                source: EngineError::AlreadyAttached(_),
                ..
            }) => {
                self.session.record_share(share.clone());
                AddShare::AlreadyAttached
            }
            Err(e) => {
                warn!(share = %share, error = %e, "could not add share");
                AddShare::Failed(e)
            }
        }
    }

    /// The session's selected share, if the peer holds it.
    ///
    /// A selection the session lists but the peer lacks is attached first.
    /// A selection naming a share the peer still does not hold is cleared in
    /// the session (with a warning) and read as no selection.
    pub fn current_share(&self) -> Option<ShareAddress> {
        let share = self.session.current_share()?;
        if self.peer.has_share(&share) {
            return Some(share);
        }
        if self.session.shares().contains(&share) {
            match self.attach(&share) {
                Ok(()) => {
                    info!(share = %share, "selected share attached");
                    return Some(share);
                }
                Err(e) => warn!(share = %share, error = %e, "could not attach selected share"),
            }
        }
        warn!(share = %share, "selected share is not attached, clearing selection");
        self.session.set_current_share(None);
        None
    }

    fn attach(&self, share: &ShareAddress) -> PeerResult<()> {
        let replica = (self.factory)(share).map_err(|source| PeerError::Factory {
            share: share.clone(),
            source,
        })?;
        self.peer
            .add_replica(replica)
            .map_err(|source| PeerError::Attach {
                share: share.clone(),
                source,
            })
    }
}
