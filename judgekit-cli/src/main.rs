use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use judgekit_evals::{Database, EvaluationManager, StoredEvalEvent};
use judgekit_events::{JsonlEventLog, channel};
use tracing::debug;

mod commands;
mod config;

use config::{ConfigLoader, JudgekitConfig};

#[derive(Parser)]
#[command(name = "judgekit", about = "Create and connect LLM evaluations")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage configuration
    Config(commands::config::ConfigArgs),
    #[command(flatten)]
    Storage(StorageCommands),
}

/// Commands that need the database and event log.
#[derive(Subcommand)]
enum StorageCommands {
    /// Apply database migrations and report the schema version
    Migrate(commands::migrate::MigrateArgs),
    /// Manage workspaces
    Workspaces(commands::workspaces::WorkspacesArgs),
    /// Manage users
    Users(commands::users::UsersArgs),
    /// Manage provider API keys
    Providers(commands::providers::ProvidersArgs),
    /// Manage evaluation templates
    Templates(commands::templates::TemplatesArgs),
    /// Create, inspect and connect evaluations
    Evaluations(commands::evaluations::EvaluationsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::load()?;
    if cli.verbose {
        config.log.filter = "debug".to_string();
    }

    let _sentry = judgekit_observe::init_sentry(&config.telemetry)?;
    judgekit_observe::init_tracing(&config.log)?;

    match cli.command {
        Commands::Config(args) => commands::config::run(args, &config),
        Commands::Storage(command) => run_with_manager(command, &config).await,
    }
}

/// Open storage and the event log, run one command, then drain pending events.
async fn run_with_manager(command: StorageCommands, config: &JudgekitConfig) -> Result<()> {
    if let Some(parent) = config.database.path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let db = Database::new_local(&config.database.path).await?;

    let log = Arc::new(JsonlEventLog::<StoredEvalEvent>::open(&config.events.path).await?);
    let (publisher, dispatcher) = channel::<StoredEvalEvent>(log);
    let dispatcher = dispatcher.spawn();
    let manager = EvaluationManager::new(db, publisher);

    let result = match command {
        StorageCommands::Migrate(args) => commands::migrate::run(args, &manager).await,
        StorageCommands::Workspaces(args) => commands::workspaces::run(args, &manager).await,
        StorageCommands::Users(args) => commands::users::run(args, &manager).await,
        StorageCommands::Providers(args) => commands::providers::run(args, &manager).await,
        StorageCommands::Templates(args) => commands::templates::run(args, &manager).await,
        StorageCommands::Evaluations(args) => commands::evaluations::run(args, &manager).await,
    };

    // Dropping the last publisher lets the dispatcher finish.
    drop(manager);
    let delivered = dispatcher.await?;
    debug!(delivered, "event log drained");

    result
}
