use std::collections::BTreeMap;
use std::sync::Arc;

use eb_types::{EventBus, ShareAddress, Subscription, SyncServerUrl};
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::traits::{Peer, PeerEvent, Replica};

/// One entry in the peer's sync log.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncOp {
    Open,
    Cancel,
}

#[derive(Default)]
struct SyncLedger {
    active: BTreeMap<SyncServerUrl, usize>,
    log: Vec<(SyncServerUrl, SyncOp)>,
}

/// An in-process peer.
///
/// Sync channels are not connected to anything; the peer keeps a ledger of
/// every open and cancel so callers can inspect channel lifecycles.
pub struct InMemoryPeer {
    replicas: RwLock<BTreeMap<ShareAddress, Arc<dyn Replica>>>,
    bus: Arc<EventBus<PeerEvent>>,
    syncs: Arc<Mutex<SyncLedger>>,
}

impl InMemoryPeer {
    pub fn new() -> Self {
        Self {
            replicas: RwLock::new(BTreeMap::new()),
            bus: Arc::new(EventBus::new()),
            syncs: Arc::new(Mutex::new(SyncLedger::default())),
        }
    }

    /// Servers with at least one open channel, and how many.
    pub fn active_syncs(&self) -> BTreeMap<SyncServerUrl, usize> {
        self.syncs.lock().active.clone()
    }

    /// Every open and cancel, in call order.
    pub fn sync_log(&self) -> Vec<(SyncServerUrl, SyncOp)> {
        self.syncs.lock().log.clone()
    }

    /// Number of wildcard listeners currently registered.
    pub fn listener_count(&self) -> usize {
        self.bus.listener_count()
    }
}

impl Default for InMemoryPeer {
    fn default() -> Self {
        Self::new()
    }
}

impl Peer for InMemoryPeer {
    fn add_replica(&self, replica: Arc<dyn Replica>) -> EngineResult<()> {
        let share = replica.share().clone();
        {
            let mut replicas = self.replicas.write();
            if replicas.contains_key(&share) {
                return Err(EngineError::AlreadyAttached(share));
            }
            replicas.insert(share.clone(), replica);
        }
        debug!(share = %share, "replica attached");
        self.bus.emit(&PeerEvent::ReplicaAdded(share));
        Ok(())
    }

    fn get_replica(&self, share: &ShareAddress) -> Option<Arc<dyn Replica>> {
        self.replicas.read().get(share).cloned()
    }

    fn shares(&self) -> Vec<ShareAddress> {
        self.replicas.read().keys().cloned().collect()
    }

    fn sync(&self, server: &SyncServerUrl) -> Subscription {
        {
            let mut ledger = self.syncs.lock();
            *ledger.active.entry(server.clone()).or_default() += 1;
            ledger.log.push((server.clone(), SyncOp::Open));
        }
        debug!(url = %server, "sync channel opened");
        self.bus.emit(&PeerEvent::SyncOpened(server.clone()));

        let syncs = Arc::clone(&self.syncs);
        let bus = Arc::clone(&self.bus);
        let server = server.clone();
        Subscription::new(move || {
            {
                let mut ledger = syncs.lock();
                if let Some(count) = ledger.active.get_mut(&server) {
                    *count -= 1;
                    if *count == 0 {
                        ledger.active.remove(&server);
                    }
                }
                ledger.log.push((server.clone(), SyncOp::Cancel));
            }
            debug!(url = %server, "sync channel closed");
            bus.emit(&PeerEvent::SyncClosed(server));
        })
    }

    fn on_any(&self, listener: Box<dyn Fn(&PeerEvent) + Send + Sync>) -> Subscription {
        self.bus.on(move |event| listener(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::replica::InMemoryReplica;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn replica(addr: &str) -> Arc<dyn Replica> {
        Arc::new(InMemoryReplica::new(ShareAddress::new(addr).unwrap()).unwrap())
    }

    fn url(s: &str) -> SyncServerUrl {
        SyncServerUrl::parse(s).unwrap()
    }

    #[test]
    fn add_and_lookup() {
        let peer = InMemoryPeer::new();
        peer.add_replica(replica("+garden.abc")).unwrap();
        let share = ShareAddress::new("+garden.abc").unwrap();
        assert!(peer.has_share(&share));
        assert!(peer.get_replica(&share).is_some());
        assert_eq!(peer.shares(), vec![share]);
    }

    #[test]
    fn duplicate_attach_fails() {
        let peer = InMemoryPeer::new();
        peer.add_replica(replica("+garden.abc")).unwrap();
        let err = peer.add_replica(replica("+garden.abc")).unwrap_err();
        assert!(matches!(err, EngineError::AlreadyAttached(_)));
        assert_eq!(peer.shares().len(), 1);
    }

    #[test]
    fn wildcard_listener_sees_attach() {
        let peer = InMemoryPeer::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let s = seen.clone();
        let sub = peer.on_any(Box::new(move |event: &PeerEvent| {
            assert!(matches!(event, PeerEvent::ReplicaAdded(_)));
            s.fetch_add(1, Ordering::SeqCst);
        }));
        peer.add_replica(replica("+garden.abc")).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        sub.cancel();
        peer.add_replica(replica("+other.abc")).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(peer.listener_count(), 0);
    }

    #[test]
    fn sync_ledger_tracks_open_and_cancel() {
        let peer = InMemoryPeer::new();
        let a = url("https://a.example");
        let handle = peer.sync(&a);
        assert_eq!(peer.active_syncs().get(&a), Some(&1));
        drop(handle);
        assert!(peer.active_syncs().is_empty());
        assert_eq!(
            peer.sync_log(),
            vec![(a.clone(), SyncOp::Open), (a, SyncOp::Cancel)]
        );
    }

    #[test]
    fn sync_lifecycle_is_published() {
        let peer = InMemoryPeer::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let _sub = peer.on_any(Box::new(move |event: &PeerEvent| {
            sink.lock().push(event.clone());
        }));
        let a = url("https://a.example");
        peer.sync(&a).cancel();
        assert_eq!(
            events.lock().clone(),
            vec![PeerEvent::SyncOpened(a.clone()), PeerEvent::SyncClosed(a)]
        );
    }
}
