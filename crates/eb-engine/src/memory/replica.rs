use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use eb_types::{EventBus, Identity, ShareAddress, Subscription};
use parking_lot::RwLock;

use crate::document::Document;
use crate::error::{EngineError, EngineResult};
use crate::traits::Replica;
use crate::validation::check_share_is_valid;

#[derive(Default)]
struct Contents {
    clock: u64,
    docs: BTreeMap<String, Document>,
}

/// A replica whose documents live in a `BTreeMap`.
pub struct InMemoryReplica {
    share: ShareAddress,
    contents: RwLock<Contents>,
    closed: AtomicBool,
    changes: EventBus<()>,
}

impl InMemoryReplica {
    /// Create an empty replica. The address must pass [`check_share_is_valid`].
    pub fn new(share: ShareAddress) -> EngineResult<Self> {
        check_share_is_valid(share.as_str())?;
        Ok(Self {
            share,
            contents: RwLock::new(Contents::default()),
            closed: AtomicBool::new(false),
            changes: EventBus::new(),
        })
    }

    /// Write `text` at `path` as `author`, replacing any previous version.
    pub fn write(&self, author: &Identity, path: &str, text: &str) -> EngineResult<Document> {
        self.ensure_open()?;
        let doc = {
            let mut contents = self.contents.write();
            contents.clock += 1;
            let doc = Document {
                path: path.to_string(),
                author: author.address.clone(),
                text: text.to_string(),
                timestamp: contents.clock,
            };
            contents.docs.insert(path.to_string(), doc.clone());
            doc
        };
        self.changes.emit(&());
        Ok(doc)
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> EngineResult<()> {
        if self.is_closed() {
            return Err(EngineError::ReplicaClosed(self.share.clone()));
        }
        Ok(())
    }
}

impl Replica for InMemoryReplica {
    fn share(&self) -> &ShareAddress {
        &self.share
    }

    fn get_latest(&self, path: &str) -> EngineResult<Option<Document>> {
        self.ensure_open()?;
        Ok(self.contents.read().docs.get(path).cloned())
    }

    fn documents(&self) -> EngineResult<Vec<Document>> {
        self.ensure_open()?;
        Ok(self.contents.read().docs.values().cloned().collect())
    }

    fn on_change(&self, listener: Box<dyn Fn() + Send + Sync>) -> Subscription {
        self.changes.on(move |_| listener())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    fn share() -> ShareAddress {
        ShareAddress::new("+garden.abc").unwrap()
    }

    fn author() -> Identity {
        Identity::new("@suzy.bxyz", "secret")
    }

    #[test]
    fn rejects_invalid_share() {
        let err = InMemoryReplica::new(ShareAddress::new("garden").unwrap()).err().unwrap();
        assert!(err.is_validation());
    }

    #[test]
    fn write_then_read() {
        let replica = InMemoryReplica::new(share()).unwrap();
        replica.write(&author(), "/notes/a", "hello").unwrap();
        let doc = replica.get_latest("/notes/a").unwrap().unwrap();
        assert_eq!(doc.text, "hello");
        assert_eq!(doc.author, "@suzy.bxyz");
        assert_eq!(doc.timestamp, 1);
    }

    #[test]
    fn overwrite_advances_timestamp() {
        let replica = InMemoryReplica::new(share()).unwrap();
        replica.write(&author(), "/a", "1").unwrap();
        replica.write(&author(), "/a", "2").unwrap();
        let docs = replica.documents().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "2");
        assert_eq!(docs[0].timestamp, 2);
    }

    #[test]
    fn change_listener_fires_per_write() {
        let replica = InMemoryReplica::new(share()).unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let _sub = replica.on_change(Box::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        replica.write(&author(), "/a", "1").unwrap();
        replica.write(&author(), "/b", "2").unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn closed_replica_refuses_io() {
        let replica = InMemoryReplica::new(share()).unwrap();
        replica.close();
        assert_eq!(
            replica.get_latest("/a").unwrap_err(),
            EngineError::ReplicaClosed(share())
        );
        assert!(replica.write(&author(), "/a", "x").is_err());
    }
}
