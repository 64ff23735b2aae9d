//! Application configuration.
//!
//! ```toml
//! namespace = "notes-app"
//! cache_max_size = 500
//! init_live = false
//! ```
//!
//! Every field is optional.

use std::fs;
use std::path::Path;

use eb_engine::DEFAULT_CACHE_SIZE;
use eb_session::SessionKeys;
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Default durable-store key prefix.
pub const DEFAULT_NAMESPACE: &str = "earthbind";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Prefix for the session's durable-store keys.
    pub namespace: String,
    /// Maximum entries buffered per replica cache.
    pub cache_max_size: usize,
    /// Live flag used when the store has none.
    pub init_live: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            cache_max_size: DEFAULT_CACHE_SIZE,
            init_live: true,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(source: &str) -> SdkResult<Self> {
        Self::parse(source, "<inline>")
    }

    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> SdkResult<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;
        Self::parse(&source, &path.display().to_string())
    }

    /// Same config with a different namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn keys(&self) -> SessionKeys {
        SessionKeys::new(&self.namespace)
    }

    fn parse(source: &str, origin: &str) -> SdkResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| SdkError::Config {
            path: origin.to_string(),
            reason: e.to_string(),
        })?;
        if config.namespace.is_empty() {
            return Err(SdkError::Config {
                path: origin.to_string(),
                reason: "namespace must not be empty".into(),
            });
        }
        Ok(config)
    }
}
