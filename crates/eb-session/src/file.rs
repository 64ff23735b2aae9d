//! A [`DurableStore`] persisted as one JSON object on disk.
//!
//! The file maps keys to string values:
//!
//! ```text
//! { "earthbind:is-live": "false", "earthbind:shares": "[\"+garden.abc\"]" }
//! ```
//!
//! Every write replaces the file atomically (temp file in the same directory,
//! then rename). Writes made by other processes are picked up by
//! [`JsonFileStore::reload`], which diffs the file against the last contents
//! this handle saw and notifies watchers once per changed key.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use eb_types::{EventBus, Subscription};
use parking_lot::Mutex;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::durable::{DurableStore, StorageEvent};
use crate::error::{SessionError, SessionResult};

/// File-backed durable store.
pub struct JsonFileStore {
    path: PathBuf,
    contents: Mutex<BTreeMap<String, String>>,
    bus: EventBus<StorageEvent>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store; the file
    /// is created on first write.
    pub fn open(path: impl AsRef<Path>) -> SessionResult<Self> {
        let path = path.as_ref().to_path_buf();
        let contents = read_contents(&path)?;
        debug!(path = %path.display(), keys = contents.len(), "session file opened");
        Ok(Self {
            path,
            contents: Mutex::new(contents),
            bus: EventBus::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file and notify watchers of every key that differs from
    /// what this handle last saw. Returns the number of changed keys.
    pub fn reload(&self) -> SessionResult<usize> {
        let fresh = read_contents(&self.path)?;
        let events = {
            let mut contents = self.contents.lock();
            let events = diff(&contents, &fresh);
            *contents = fresh;
            events
        };
        for event in &events {
            self.bus.emit(event);
        }
        if !events.is_empty() {
            debug!(path = %self.path.display(), changed = events.len(), "session file reloaded");
        }
        Ok(events.len())
    }

    fn save(&self, contents: &BTreeMap<String, String>) -> SessionResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;
        let json = serde_json::to_vec_pretty(contents).map_err(|e| SessionError::CorruptFile {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| SessionError::Io(e.error))?;
        Ok(())
    }
}

impl DurableStore for JsonFileStore {
    fn get(&self, key: &str) -> SessionResult<Option<String>> {
        Ok(self.contents.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> SessionResult<()> {
        let mut contents = self.contents.lock();
        let previous = contents.insert(key.to_string(), value.to_string());
        if let Err(e) = self.save(&contents) {
            match previous {
                Some(old) => contents.insert(key.to_string(), old),
                None => contents.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> SessionResult<()> {
        let mut contents = self.contents.lock();
        let Some(previous) = contents.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.save(&contents) {
            contents.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }

    fn watch(&self, listener: Box<dyn Fn(&StorageEvent) + Send + Sync>) -> Subscription {
        self.bus.on(move |event| listener(event))
    }
}

fn read_contents(path: &Path) -> SessionResult<BTreeMap<String, String>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(e.into()),
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(BTreeMap::new());
    }
    serde_json::from_slice(&bytes).map_err(|e| SessionError::CorruptFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn diff(old: &BTreeMap<String, String>, new: &BTreeMap<String, String>) -> Vec<StorageEvent> {
    let mut events = Vec::new();
    for (key, value) in new {
        if old.get(key) != Some(value) {
            events.push(StorageEvent {
                key: key.clone(),
                value: Some(value.clone()),
            });
        }
    }
    for key in old.keys() {
        if !new.contains_key(key) {
            events.push(StorageEvent {
                key: key.clone(),
                value: None,
            });
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("session.json")).unwrap();
        assert_eq!(store.get("k").unwrap(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn writes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        {
            let store = JsonFileStore::open(&path).unwrap();
            store.set("a", "1").unwrap();
            store.set("b", "2").unwrap();
            store.remove("a").unwrap();
        }
        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.get("b").unwrap(), Some("2".into()));
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/session.json");
        let store = JsonFileStore::open(&path).unwrap();
        store.set("k", "v").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "[1, 2, 3]").unwrap();
        let err = JsonFileStore::open(&path).err().unwrap();
        assert!(matches!(err, SessionError::CorruptFile { .. }));
    }

    #[test]
    fn own_writes_are_not_announced() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("s.json")).unwrap();
        let heard = Arc::new(Mutex::new(Vec::new()));
        let sink = heard.clone();
        let _sub = store.watch(Box::new(move |event: &StorageEvent| {
            sink.lock().push(event.clone())
        }));
        store.set("k", "v").unwrap();
        assert_eq!(store.reload().unwrap(), 0);
        assert!(heard.lock().is_empty());
    }

    #[test]
    fn reload_announces_external_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        let ours = JsonFileStore::open(&path).unwrap();
        ours.set("kept", "same").unwrap();
        ours.set("dropped", "x").unwrap();

        let theirs = JsonFileStore::open(&path).unwrap();
        theirs.set("added", "new").unwrap();
        theirs.remove("dropped").unwrap();

        let heard = Arc::new(Mutex::new(Vec::new()));
        let sink = heard.clone();
        let _sub = ours.watch(Box::new(move |event: &StorageEvent| {
            sink.lock().push(event.clone())
        }));

        assert_eq!(ours.reload().unwrap(), 2);
        assert_eq!(
            heard.lock().clone(),
            vec![
                StorageEvent { key: "added".into(), value: Some("new".into()) },
                StorageEvent { key: "dropped".into(), value: None },
            ]
        );
        assert_eq!(ours.get("added").unwrap(), Some("new".into()));
    }
}
