//! OpsDesk CLI - server and local tooling for the admin console

pub mod app;
pub mod config;

pub use app::{build_router, AppState};
