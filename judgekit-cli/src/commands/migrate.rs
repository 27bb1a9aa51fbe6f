//! Schema migration command.

use anyhow::Result;
use clap::Args;
use judgekit_evals::EvaluationManager;
use judgekit_evals::storage::migrations::Migrator;
use serde_json::json;

/// Migrate arguments. Opening the database already applies pending
/// migrations; this reports where the schema stands.
#[derive(Args, Debug)]
pub struct MigrateArgs {}

pub async fn run(_args: MigrateArgs, manager: &EvaluationManager) -> Result<()> {
    let migrator = Migrator::new(manager.database().connection());
    let version = migrator.current_version().await?;
    super::print_json(&json!({
        "schemaVersion": version,
        "targetVersion": migrator.target_version(),
    }))
}
