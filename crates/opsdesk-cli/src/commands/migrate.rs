//! Schema migration command

use clap::Args;
use opsdesk_cli::config::StoreArgs;

#[derive(Debug, Args)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub store: StoreArgs,
}

pub fn execute(args: MigrateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let db = args.store.open()?;
    let status = db.status();
    println!(
        "{} ready: {} migration(s) applied, initialized={}",
        status.location, status.migrations_applied, status.initialized
    );
    Ok(())
}
