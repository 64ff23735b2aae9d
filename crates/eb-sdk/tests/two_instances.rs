//! Two application instances sharing one durable store namespace.

use std::sync::Arc;

use eb_engine::{InMemoryCacheFactory, InMemoryPeer, Peer};
use eb_peer::memory_replicas;
use eb_sdk::{
    AppConfig, DurableStore, Earthbind, JsonFileStore, MemoryBackend, ShareAddress, SyncServerUrl,
};

fn url(s: &str) -> SyncServerUrl {
    SyncServerUrl::parse(s).unwrap()
}

fn share(s: &str) -> ShareAddress {
    ShareAddress::new(s).unwrap()
}

fn instance(backend: &Arc<MemoryBackend>) -> (Arc<InMemoryPeer>, Earthbind) {
    let peer = Arc::new(InMemoryPeer::new());
    let app = Earthbind::open(
        AppConfig::default(),
        Arc::new(backend.handle()),
        peer.clone(),
        memory_replicas(),
        Arc::new(InMemoryCacheFactory::new()),
    );
    (peer, app)
}

#[test]
fn going_offline_in_one_instance_closes_the_others_syncs() {
    let backend = MemoryBackend::new();
    let (peer_a, mut a) = instance(&backend);
    let (peer_b, mut b) = instance(&backend);

    a.add_sync_server(url("https://a.example"));
    a.add_sync_server(url("https://b.example"));
    a.tick().unwrap();
    b.tick().unwrap();
    assert_eq!(peer_a.active_syncs().len(), 2);
    assert_eq!(peer_b.active_syncs().len(), 2);

    a.set_live(false);
    assert!(!b.session().is_live());

    let report = b.tick().unwrap();
    assert_eq!(report.sync.closed.len(), 2);
    assert!(peer_b.active_syncs().is_empty());

    a.tick().unwrap();
    assert!(peer_a.active_syncs().is_empty());
}

#[test]
fn shares_and_selection_propagate() {
    let backend = MemoryBackend::new();
    let (_, a) = instance(&backend);
    let (_, b) = instance(&backend);

    a.add_share(&share("+garden.abc"));
    a.select_share(Some(share("+garden.abc")));

    assert_eq!(b.session().shares(), vec![share("+garden.abc")]);
    assert_eq!(b.session().current_share(), Some(share("+garden.abc")));
}

#[test]
fn lagging_instance_catches_up_without_clearing_the_selection() {
    let backend = MemoryBackend::new();
    let (_, mut a) = instance(&backend);
    let (peer_b, mut b) = instance(&backend);

    a.add_share(&share("+garden.abc"));
    a.select_share(Some(share("+garden.abc")));
    assert!(!peer_b.has_share(&share("+garden.abc")));

    let report = b.tick().unwrap();
    assert!(peer_b.has_share(&share("+garden.abc")));
    assert_eq!(report.cache_share, Some(share("+garden.abc")));
    assert!(b.cache().is_some());

    assert_eq!(a.session().current_share(), Some(share("+garden.abc")));
    assert_eq!(a.tick().unwrap().cache_share, Some(share("+garden.abc")));
}

#[test]
fn shares_from_another_instance_are_attached_on_tick() {
    let backend = MemoryBackend::new();
    let (_, a) = instance(&backend);
    let (peer_b, mut b) = instance(&backend);

    a.add_share(&share("+garden.abc"));
    a.add_share(&share("+notes.xyz"));
    b.tick().unwrap();

    assert_eq!(
        peer_b.shares(),
        vec![share("+garden.abc"), share("+notes.xyz")]
    );
    assert_eq!(b.tick().unwrap().cache_share, None);
}

#[test]
fn a_new_instance_starts_from_the_stored_session() {
    let backend = MemoryBackend::new();
    let (_, first) = instance(&backend);
    first.add_share(&share("+garden.abc"));
    first.select_share(Some(share("+garden.abc")));
    first.add_sync_server(url("https://a.example"));
    first.set_live(false);

    let (peer, mut second) = instance(&backend);
    assert!(peer.has_share(&share("+garden.abc")));
    assert!(!second.session().is_live());
    let report = second.tick().unwrap();
    assert_eq!(report.cache_share, Some(share("+garden.abc")));
    assert!(peer.active_syncs().is_empty());
}

#[test]
fn file_store_reload_refreshes_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let ours = Arc::new(JsonFileStore::open(&path).unwrap());
    let mut app = Earthbind::in_memory(AppConfig::default(), ours.clone());
    app.add_sync_server(url("https://a.example"));
    assert_eq!(app.tick().unwrap().sync.opened.len(), 1);

    let theirs = JsonFileStore::open(&path).unwrap();
    theirs.set("earthbind:is-live", "false").unwrap();

    assert_eq!(ours.reload().unwrap(), 1);
    assert!(!app.session().is_live());
    assert_eq!(app.tick().unwrap().sync.closed.len(), 1);
}
