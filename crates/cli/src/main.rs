//! Rollcall CLI - database migrations and sample data.
//!
//! # Usage
//!
//! ```bash
//! # Apply embedded migrations to DATABASE_URL
//! rollcall migrate
//!
//! # Insert 50 sample users (existing emails are skipped)
//! rollcall seed --count 50
//! ```
//!
//! Both commands read the same environment (and `.env`) as the server.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "rollcall")]
#[command(version, about = "Rollcall operational tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Insert sample users through the record store
    Seed {
        /// Number of users to insert
        #[arg(short, long, default_value_t = 25)]
        count: u32,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { count } => {
            let summary = commands::seed::run(count).await?;
            tracing::info!(
                created = summary.created,
                skipped = summary.skipped,
                "Seeding complete"
            );
        }
    }
    Ok(())
}
