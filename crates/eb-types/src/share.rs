use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identifier of a replicated share, e.g. `+gardening.abc123`.
///
/// Only non-emptiness is checked here. Whether an address is well-formed is
/// decided by the replication engine (see `eb_engine::check_share_is_valid`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShareAddress(String);

impl ShareAddress {
    /// Wrap a non-empty address string.
    pub fn new(address: impl Into<String>) -> Result<Self, TypeError> {
        let address = address.into();
        if address.is_empty() {
            return Err(TypeError::EmptyShareAddress);
        }
        Ok(Self(address))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The human part of the address, between the leading `+` and the first `.`.
    pub fn name(&self) -> &str {
        let rest = self.0.strip_prefix('+').unwrap_or(&self.0);
        rest.split('.').next().unwrap_or(rest)
    }
}

impl fmt::Debug for ShareAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShareAddress({})", self.0)
    }
}

impl fmt::Display for ShareAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ShareAddress {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ShareAddress {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ShareAddress> for String {
    fn from(value: ShareAddress) -> Self {
        value.0
    }
}

impl AsRef<str> for ShareAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty() {
        assert_eq!(ShareAddress::new(""), Err(TypeError::EmptyShareAddress));
    }

    #[test]
    fn name_strips_prefix_and_suffix() {
        let share = ShareAddress::new("+gardening.abc123").unwrap();
        assert_eq!(share.name(), "gardening");
        assert_eq!(share.as_str(), "+gardening.abc123");
    }

    #[test]
    fn serde_is_a_plain_string() {
        let share: ShareAddress = "+share.foo".parse().unwrap();
        let json = serde_json::to_string(&share).unwrap();
        assert_eq!(json, "\"+share.foo\"");
        let parsed: ShareAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, share);
    }

    #[test]
    fn serde_rejects_empty_string() {
        assert!(serde_json::from_str::<ShareAddress>("\"\"").is_err());
    }
}
