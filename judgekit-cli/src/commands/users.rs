use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use judgekit_evals::{EvaluationManager, NewUser};

#[derive(Args, Debug)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommands,
}

#[derive(Subcommand, Debug)]
pub enum UsersCommands {
    /// Register a user
    Create {
        /// External user id
        #[arg(long)]
        id: String,
        /// Unique email address
        #[arg(long)]
        email: String,
        /// Display name
        #[arg(long)]
        name: Option<String>,
    },
    /// Show a user
    Show {
        /// User id
        id: String,
        /// Also resolve the session for this workspace
        #[arg(long)]
        workspace: Option<i64>,
    },
}

pub async fn run(args: UsersArgs, manager: &EvaluationManager) -> Result<()> {
    match args.command {
        UsersCommands::Create { id, email, name } => {
            let user = manager.create_user(NewUser { id, email, name }).await?;
            super::print_json(&user)
        }
        UsersCommands::Show {
            id,
            workspace: Some(workspace_id),
        } => {
            let session = manager.session_data(&id, workspace_id).await?;
            super::print_json(&session)
        }
        UsersCommands::Show {
            id,
            workspace: None,
        } => match manager.get_user(Some(&id)).await? {
            Some(user) => super::print_json(&user),
            None => bail!("User not found"),
        },
    }
}
