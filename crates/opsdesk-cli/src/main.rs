//! OpsDesk CLI
//!
//! Command-line interface for the OpsDesk admin console

use clap::{Parser, Subcommand};
use opsdesk_core::logging_facility::{init, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "opsdesk")]
#[command(about = "OpsDesk - Admin console command API", long_about = None)]
struct Cli {
    /// Log profile: dev, prod or test
    #[arg(long, global = true, env = "OPSDESK_LOG", default_value = "dev")]
    log: Profile,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve the command API over HTTP
    Serve(opsdesk_cli::config::ServeArgs),
    /// Apply pending schema migrations
    Migrate(commands::migrate::MigrateArgs),
    /// Dispatch one command locally and print the response
    Command(commands::command::CommandArgs),
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init(cli.log);

    let result = match cli.command {
        Commands::Serve(args) => commands::serve::execute(args).await,
        Commands::Migrate(args) => commands::migrate::execute(args),
        Commands::Command(args) => commands::command::execute(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
