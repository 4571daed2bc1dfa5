//! FinPilot CLI — the main entry point.
//!
//! Commands:
//! - `onboard`   — Write a default config and data directory
//! - `dashboard` — Show KPIs, budget usage and category totals
//! - `income`    — List income sources derived from transactions
//! - `ask`       — Ask the assistant, once or interactively
//! - `analyze`   — Advisor report over category totals
//! - `import`    — Load records from a JSON file
//! - `doctor`    — Diagnose config, credentials and store

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "finpilot",
    about = "FinPilot — personal finance dashboard and AI assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and data directory
    Onboard,

    /// Show the financial dashboard for a user
    Dashboard {
        /// User whose records to read
        #[arg(short, long, env = "FINPILOT_USER")]
        user: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List income sources
    Income {
        #[arg(short, long, env = "FINPILOT_USER")]
        user: String,

        #[arg(long)]
        json: bool,
    },

    /// Ask the finance assistant
    Ask {
        #[arg(short, long, env = "FINPILOT_USER")]
        user: String,

        /// Ask a single question instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Get an advisor report on spending patterns
    Analyze {
        #[arg(short, long, env = "FINPILOT_USER")]
        user: String,

        #[arg(long)]
        json: bool,
    },

    /// Import transactions, budgets and income from a JSON file
    Import {
        #[arg(short, long, env = "FINPILOT_USER")]
        user: String,

        /// Path to the JSON file
        file: std::path::PathBuf,
    },

    /// Diagnose system health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Dashboard { user, json } => commands::dashboard::run(user, json).await?,
        Commands::Income { user, json } => commands::income::run(user, json).await?,
        Commands::Ask { user, message } => commands::ask::run(user, message).await?,
        Commands::Analyze { user, json } => commands::analyze::run(user, json).await?,
        Commands::Import { user, file } => commands::import::run(user, file).await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
