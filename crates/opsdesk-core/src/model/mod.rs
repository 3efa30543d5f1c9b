pub mod audit_log;
pub mod command;
pub mod command_log;
pub mod pagination;
pub mod system_config;
pub mod timestamp;
pub mod user;

pub use audit_log::{AuditLog, AuditLogFilter, NewAuditEntry};
pub use command::{CommandResponse, CommandResult, ValidationIssue};
pub use command_log::{CommandLogEntry, CommandLogSummary, CommandStatus};
pub use pagination::{Page, PageRequest, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
pub use system_config::{NewSystemConfig, SystemConfig, SystemConfigFilter, SystemConfigPatch};
pub use user::{NewUser, SortOrder, User, UserFilter, UserPatch, UserSortKey};
