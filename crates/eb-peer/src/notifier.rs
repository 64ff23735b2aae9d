use eb_engine::{Peer, PeerEvent};
use eb_types::{Invalidator, Subscription};
use tokio::sync::watch;

/// Bumps a revision on every peer event.
///
/// The event payload is discarded. Dependents that derive values from the
/// peer's composition (attached shares, `has_share`) compare revisions and
/// recompute when it moves. The wildcard listener is released on drop.
pub struct PeerChangeNotifier {
    invalidator: Invalidator,
    _listener: Subscription,
}

impl PeerChangeNotifier {
    pub fn new(peer: &dyn Peer) -> Self {
        let invalidator = Invalidator::new();
        let bump = invalidator.clone();
        let listener = peer.on_any(Box::new(move |_: &PeerEvent| bump.invalidate()));
        Self {
            invalidator,
            _listener: listener,
        }
    }

    pub fn revision(&self) -> u64 {
        self.invalidator.revision()
    }

    pub fn watch(&self) -> watch::Receiver<u64> {
        self.invalidator.watch()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eb_engine::{InMemoryPeer, InMemoryReplica};
    use eb_types::{ShareAddress, SyncServerUrl};
    use std::sync::Arc;

    fn replica(addr: &str) -> Arc<InMemoryReplica> {
        Arc::new(InMemoryReplica::new(ShareAddress::new(addr).unwrap()).unwrap())
    }

    #[test]
    fn any_event_bumps() {
        let peer = InMemoryPeer::new();
        let notifier = PeerChangeNotifier::new(&peer);
        assert_eq!(notifier.revision(), 0);
        peer.add_replica(replica("+garden.abc")).unwrap();
        assert_eq!(notifier.revision(), 1);
        let _channel = peer.sync(&SyncServerUrl::parse("https://a.example").unwrap());
        assert_eq!(notifier.revision(), 2);
    }

    #[test]
    fn listener_released_on_drop() {
        let peer = InMemoryPeer::new();
        let notifier = PeerChangeNotifier::new(&peer);
        assert_eq!(peer.listener_count(), 1);
        drop(notifier);
        assert_eq!(peer.listener_count(), 0);
    }

    #[test]
    fn watch_observes_bumps() {
        let peer = InMemoryPeer::new();
        let notifier = PeerChangeNotifier::new(&peer);
        let mut rx = notifier.watch();
        peer.add_replica(replica("+garden.abc")).unwrap();
        assert!(rx.has_changed().unwrap());
    }
}
