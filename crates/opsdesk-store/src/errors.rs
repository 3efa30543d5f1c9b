//! Error handling for opsdesk-store
//!
//! Wraps opsdesk-core ExError with store-specific helpers

use opsdesk_core::errors::{ExError, ExErrorKind};
use rusqlite::ffi;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}

/// Create a database error from rusqlite::Error
///
/// UNIQUE and PRIMARY KEY violations become `AlreadyExists` so handlers can
/// report them as ordinary domain failures; everything else is `Persistence`.
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    let kind = if is_unique_violation(&err) {
        ExErrorKind::AlreadyExists
    } else {
        ExErrorKind::Persistence
    };
    ExError::new(kind)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create an error for a JSON column that failed to encode or decode
pub fn json_column(column: &str, err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op("json_column")
        .with_message(format!("column {}: {}", column, err))
}

/// Create an error for an unusable connection string
pub fn invalid_url(url: &str) -> ExError {
    ExError::new(ExErrorKind::Config)
        .with_op("db_open")
        .with_message(format!("unsupported database url: {}", url))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.code == rusqlite::ErrorCode::ConstraintViolation
                && (e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
        }
        _ => false,
    }
}
