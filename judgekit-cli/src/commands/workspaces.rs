use anyhow::Result;
use clap::{Args, Subcommand};
use judgekit_evals::{EvaluationManager, NewWorkspace};

#[derive(Args, Debug)]
pub struct WorkspacesArgs {
    #[command(subcommand)]
    pub command: WorkspacesCommands,
}

#[derive(Subcommand, Debug)]
pub enum WorkspacesCommands {
    /// Create a workspace
    Create {
        /// Workspace name
        #[arg(long)]
        name: String,
    },
    /// Show a workspace
    Show {
        /// Workspace id
        id: i64,
    },
}

pub async fn run(args: WorkspacesArgs, manager: &EvaluationManager) -> Result<()> {
    match args.command {
        WorkspacesCommands::Create { name } => {
            let workspace = manager.create_workspace(NewWorkspace { name }).await?;
            super::print_json(&workspace)
        }
        WorkspacesCommands::Show { id } => {
            let workspace = manager.find_workspace(id).await?;
            super::print_json(&workspace)
        }
    }
}
