use serde::{Deserialize, Serialize};

/// A single document held by a replica.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub path: String,
    pub author: String,
    pub text: String,
    /// Monotonic write stamp within the owning replica.
    pub timestamp: u64,
}
