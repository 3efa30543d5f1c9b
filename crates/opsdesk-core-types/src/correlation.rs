//! Request correlation
//!
//! Every dispatched command gets a `RequestId`. The same value is returned to
//! the caller as `requestId` and stored as the command log's `commandId`.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const REQUEST_ID_PREFIX: &str = "cmd_";

/// `cmd_` followed by a hyphen-less UUIDv7, so ids sort by creation time
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub fn new() -> Self {
        Self(format!("{}{}", REQUEST_ID_PREFIX, Uuid::now_v7().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap an id read back from storage
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<str> for RequestId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<RequestId> for String {
    fn from(id: RequestId) -> Self {
        id.0
    }
}
