//! Types shared by every OpsDesk layer
//!
//! - [`RequestId`]: per-command correlation id
//! - [`Sensitive`]: redacting wrapper for the admin secret and keys
//! - [`schema`]: logging field keys and lifecycle event names

pub mod correlation;
pub mod schema;
pub mod sensitive;

pub use correlation::{RequestId, REQUEST_ID_PREFIX};
pub use sensitive::{Sensitive, REDACTED};
