//! Database connection management
//!
//! A [`Database`] owns the single shared SQLite connection. Callers borrow it
//! through [`Database::with_conn`]; every statement is atomic on its own and
//! no transaction spans more than one repository call.

use crate::errors::{from_rusqlite, invalid_url, Result};
use crate::migrations::{applied_migrations, apply_migrations};
use crate::repo::SystemMetaRepo;
use rusqlite::Connection;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Key in `system_meta` set once the schema has been created
pub const DB_INITIALIZED_KEY: &str = "db_initialized";

/// Open a SQLite database at the given path
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    Connection::open(path).map_err(from_rusqlite)
}

/// Open an in-memory SQLite database (for testing)
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(from_rusqlite)
}

/// Configure a connection with optimal settings
pub fn configure(conn: &Connection) -> Result<()> {
    // journal_mode returns a row, so this cannot go through execute()
    conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL;")
        .map_err(from_rusqlite)?;

    Ok(())
}

/// Where a database lives, parsed from a connection string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    Memory,
    File(PathBuf),
}

impl DatabaseLocation {
    /// Parse `sqlite::memory:`, `:memory:`, `sqlite://<path>`, `sqlite:<path>` or a bare path
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();
        if url.is_empty() {
            return Err(invalid_url(url));
        }
        if url == ":memory:" || url == "sqlite::memory:" || url == "sqlite://:memory:" {
            return Ok(DatabaseLocation::Memory);
        }
        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);
        if path.is_empty() || path.contains("://") {
            return Err(invalid_url(url));
        }
        Ok(DatabaseLocation::File(PathBuf::from(path)))
    }
}

impl std::fmt::Display for DatabaseLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseLocation::Memory => write!(f, "sqlite::memory:"),
            DatabaseLocation::File(path) => write!(f, "sqlite://{}", path.display()),
        }
    }
}

/// Connectivity and schema state reported by health checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStatus {
    pub connected: bool,
    pub initialized: bool,
    pub migrations_applied: usize,
    pub location: String,
}

/// Shared handle to the console database
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    location: DatabaseLocation,
}

impl Database {
    /// Open and configure the database named by a connection string
    ///
    /// # Errors
    ///
    /// Fails on an unusable connection string or if SQLite cannot open the file.
    pub fn connect(url: &str) -> Result<Self> {
        let location = DatabaseLocation::parse(url)?;
        let conn = match &location {
            DatabaseLocation::Memory => open_in_memory()?,
            DatabaseLocation::File(path) => open(path)?,
        };
        configure(&conn)?;
        tracing::debug!(location = %location, "database opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            location,
        })
    }

    /// Fresh, migrated in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let db = Self::connect("sqlite::memory:")?;
        db.migrate()?;
        Ok(db)
    }

    pub fn location(&self) -> &DatabaseLocation {
        &self.location
    }

    /// Run a closure against the shared connection
    ///
    /// # Errors
    ///
    /// Returns the closure's error.
    pub fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let guard = self.lock();
        f(&guard)
    }

    /// Apply pending migrations; returns how many ran
    pub fn migrate(&self) -> Result<usize> {
        let mut guard = self.lock();
        apply_migrations(&mut guard)
    }

    // A panicking holder leaves no partial write behind: every statement
    // commits or rolls back on its own, so the connection stays usable.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("recovering database connection after a panicked holder");
            self.conn.clear_poison();
            poisoned.into_inner()
        })
    }

    /// Round-trip a trivial query
    pub fn ping(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .map_err(from_rusqlite)?;
            Ok(())
        })
    }

    /// Whether the schema has been created and flagged in `system_meta`
    pub fn is_initialized(&self) -> Result<bool> {
        self.with_conn(|conn| {
            Ok(SystemMetaRepo::get(conn, DB_INITIALIZED_KEY)?.as_deref() == Some("true"))
        })
    }

    /// Snapshot of connectivity and schema state
    ///
    /// Never fails: an unreachable database reports `connected: false`.
    pub fn status(&self) -> DatabaseStatus {
        let connected = self.ping().is_ok();
        let initialized = connected && self.is_initialized().unwrap_or(false);
        let migrations_applied = self
            .with_conn(applied_migrations)
            .map(|m| m.len())
            .unwrap_or(0);
        DatabaseStatus {
            connected,
            initialized,
            migrations_applied,
            location: self.location.to_string(),
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}
