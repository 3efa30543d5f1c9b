//! OpsDesk Core - domain kernel for the admin command console
//!
//! This crate provides the pieces every other layer shares:
//! - The error facility (`ExError`, stable error codes, domain `OpsError`)
//! - The logging facility (subscriber init, boundary macros, test capture)
//! - Entity and command models with their wire shapes
//! - Command request schema validation
//! - The admin-key authorization policy

pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod policy;
pub mod request;

#[doc(hidden)]
pub use opsdesk_core_types as __types;

// Re-export commonly used types
pub use errors::{ExError, ExErrorKind, OpsError, Result};
pub use model::{CommandResponse, CommandResult, CommandStatus, ValidationIssue};
pub use policy::{AdminKeyPolicy, StaticAdminKeyPolicy};
pub use request::CommandRequest;
