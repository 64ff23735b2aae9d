//! The namespaced key scheme for persisted sessions.
//!
//! Each session field lives under `<namespace>:<suffix>`:
//!
//! | suffix            | value                  |
//! |-------------------|------------------------|
//! | `identity`        | identity object        |
//! | `replica-servers` | list of server URLs    |
//! | `shares`          | list of share addresses|
//! | `current-share`   | share address          |
//! | `is-live`         | boolean                |

pub const IDENTITY: &str = "identity";
pub const REPLICA_SERVERS: &str = "replica-servers";
pub const SHARES: &str = "shares";
pub const CURRENT_SHARE: &str = "current-share";
pub const IS_LIVE: &str = "is-live";

/// Fully qualified keys for one session namespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionKeys {
    pub identity: String,
    pub replica_servers: String,
    pub shares: String,
    pub current_share: String,
    pub is_live: String,
}

impl SessionKeys {
    pub fn new(namespace: &str) -> Self {
        Self {
            identity: make_key(namespace, IDENTITY),
            replica_servers: make_key(namespace, REPLICA_SERVERS),
            shares: make_key(namespace, SHARES),
            current_share: make_key(namespace, CURRENT_SHARE),
            is_live: make_key(namespace, IS_LIVE),
        }
    }

    /// All five keys.
    pub fn all(&self) -> [&str; 5] {
        [
            &self.identity,
            &self.replica_servers,
            &self.shares,
            &self.current_share,
            &self.is_live,
        ]
    }

    /// Whether `key` belongs to this session.
    pub fn contains(&self, key: &str) -> bool {
        self.all().contains(&key)
    }
}

fn make_key(namespace: &str, suffix: &str) -> String {
    format!("{namespace}:{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced() {
        let keys = SessionKeys::new("notes-app");
        assert_eq!(keys.identity, "notes-app:identity");
        assert_eq!(keys.replica_servers, "notes-app:replica-servers");
        assert_eq!(keys.shares, "notes-app:shares");
        assert_eq!(keys.current_share, "notes-app:current-share");
        assert_eq!(keys.is_live, "notes-app:is-live");
    }

    #[test]
    fn contains_only_own_keys() {
        let keys = SessionKeys::new("a");
        assert!(keys.contains("a:is-live"));
        assert!(!keys.contains("b:is-live"));
        assert!(!keys.contains("a:theme"));
    }
}
