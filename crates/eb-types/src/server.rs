use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::TypeError;

/// A remote synchronization endpoint.
///
/// The original string is kept as given. `url` normalizes (`https://a.example`
/// becomes `https://a.example/`), and the session and invitations must hand
/// back exactly the text they were given, so parsing is only a validity gate.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SyncServerUrl(String);

impl SyncServerUrl {
    /// Accept `raw` if it parses as an absolute URL.
    pub fn parse(raw: impl Into<String>) -> Result<Self, TypeError> {
        let raw = raw.into();
        Url::parse(&raw).map_err(|e| TypeError::InvalidServerUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SyncServerUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SyncServerUrl({})", self.0)
    }
}

impl fmt::Display for SyncServerUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SyncServerUrl {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SyncServerUrl {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<SyncServerUrl> for String {
    fn from(value: SyncServerUrl) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_text_verbatim() {
        let url = SyncServerUrl::parse("https://a.example").unwrap();
        assert_eq!(url.as_str(), "https://a.example");
    }

    #[test]
    fn rejects_relative() {
        let err = SyncServerUrl::parse("not a url").unwrap_err();
        assert!(matches!(err, TypeError::InvalidServerUrl { .. }));
    }

    #[test]
    fn serde_rejects_garbage() {
        assert!(serde_json::from_str::<SyncServerUrl>("\"::::\"").is_err());
        let ok: SyncServerUrl = serde_json::from_str("\"wss://pub.example/sync\"").unwrap();
        assert_eq!(ok.as_str(), "wss://pub.example/sync");
    }
}
