//! OpsDesk Engine - Command orchestration layer
//!
//! Routes validated commands to entity handlers, enforces the admin-key
//! policy, and records every attempt in the command log.
//!
//! - [`registry`]: entity name to handler lookup
//! - [`handlers`]: `users`, `system_config` and `audit_logs` operations
//! - [`dispatcher`]: validation, authorization, execution and logging
//! - [`discovery`]: self-description of entities and endpoints
//! - [`metrics`]: request counters and command-log statistics

pub mod discovery;
pub mod dispatcher;
pub mod handlers;
pub mod metrics;
pub mod registry;

pub use discovery::{discovery_document, DiscoveryDocument};
pub use dispatcher::{DispatchOutcome, Dispatcher, ResponseClass};
pub use handlers::EntityHandler;
pub use metrics::{DispatchMetrics, MetricsReport};
pub use registry::CommandRegistry;
