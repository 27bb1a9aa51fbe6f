pub mod config;
pub mod evaluations;
pub mod migrate;
pub mod providers;
pub mod templates;
pub mod users;
pub mod workspaces;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use judgekit_evals::{EvaluationManager, ResultType, User, Workspace, WorkspaceId};
use serde::Serialize;

/// Identity a command acts as.
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Workspace id
    #[arg(long)]
    pub workspace: WorkspaceId,

    /// Acting user id
    #[arg(long)]
    pub user: String,
}

impl SessionArgs {
    /// Load the full workspace and user rows.
    pub async fn resolve(&self, manager: &EvaluationManager) -> Result<(Workspace, User)> {
        let workspace = manager.find_workspace(self.workspace).await?;
        let user = manager.find_user(&self.user).await?;
        Ok((workspace, user))
    }
}

/// Result shape selected on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Boolean,
    Number,
    Text,
}

impl From<ResultKind> for ResultType {
    fn from(kind: ResultKind) -> Self {
        match kind {
            ResultKind::Boolean => ResultType::Boolean,
            ResultKind::Number => ResultType::Number,
            ResultKind::Text => ResultType::Text,
        }
    }
}

/// Parse an optional JSON argument, treating absence as `null`.
pub fn parse_json_arg(raw: Option<&str>) -> Result<serde_json::Value> {
    match raw {
        Some(text) => serde_json::from_str(text).context("argument is not valid JSON"),
        None => Ok(serde_json::Value::Null),
    }
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
