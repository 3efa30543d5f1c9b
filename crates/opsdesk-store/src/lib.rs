//! OpsDesk Store - SQLite persistence for the admin console
//!
//! Provides:
//! - A shared connection handle with health reporting
//! - Embedded, checksummed schema migrations
//! - Repositories for users, system config, audit logs and the command log

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;

// Re-export key types
pub use db::{Database, DatabaseLocation, DatabaseStatus};
pub use errors::Result;
