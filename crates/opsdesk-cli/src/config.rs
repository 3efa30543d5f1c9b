//! Command-line and environment configuration
//!
//! Every setting can come from a flag or its environment variable; a `.env`
//! file in the working directory is loaded before parsing.

use clap::Args;
use opsdesk_core::policy::StaticAdminKeyPolicy;
use opsdesk_core_types::Sensitive;
use opsdesk_store::Database;
use std::net::SocketAddr;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://opsdesk.db";
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Where the store lives
#[derive(Debug, Clone, Args)]
pub struct StoreArgs {
    /// `sqlite::memory:`, `sqlite://<path>` or a bare file path
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,
}

impl StoreArgs {
    /// Open the store and bring its schema up to date
    ///
    /// # Errors
    ///
    /// Fails when the URL is unusable, the file cannot be opened, or a
    /// migration fails.
    pub fn open(&self) -> opsdesk_core::Result<Database> {
        let db = Database::connect(&self.database_url)?;
        let applied = db.migrate()?;
        tracing::info!(location = %db.location(), applied, "store ready");
        Ok(db)
    }
}

/// Shared admin secret
#[derive(Clone, Args)]
pub struct AdminArgs {
    /// Secret that admin operations must present as `adminKey`
    #[arg(
        long = "admin-secret",
        env = "ADMIN_SECRET_KEY",
        hide_env_values = true
    )]
    pub admin_secret: Option<String>,
}

impl std::fmt::Debug for AdminArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminArgs")
            .field("admin_secret", &self.secret())
            .finish()
    }
}

impl AdminArgs {
    pub fn secret(&self) -> Option<Sensitive<String>> {
        self.admin_secret.clone().map(Sensitive::new)
    }

    /// Default console policy over the configured secret
    pub fn policy(&self) -> StaticAdminKeyPolicy {
        let policy = StaticAdminKeyPolicy::with_default_rules(self.secret());
        if !policy.has_secret() {
            tracing::warn!("ADMIN_SECRET_KEY is not set; admin operations will be rejected");
        }
        policy
    }
}

/// Settings for `opsdesk serve`
#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub admin: AdminArgs,

    /// Listen address
    #[arg(long, env = "OPSDESK_BIND", default_value = DEFAULT_BIND)]
    pub bind: SocketAddr,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_args_debug_hides_secret() {
        let args = AdminArgs {
            admin_secret: Some("hunter2".to_string()),
        };
        let text = format!("{:?}", args);
        assert!(!text.contains("hunter2"));
        assert!(text.contains(opsdesk_core_types::REDACTED));
    }

    #[test]
    fn test_policy_without_secret() {
        let args = AdminArgs { admin_secret: None };
        assert!(!args.policy().has_secret());
    }

    #[test]
    fn test_store_args_open_in_memory() {
        let store = StoreArgs {
            database_url: "sqlite::memory:".to_string(),
        };
        let db = store.open().unwrap();
        assert!(db.is_initialized().unwrap());
    }
}
