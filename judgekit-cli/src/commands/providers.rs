use anyhow::Result;
use clap::{Args, Subcommand};
use judgekit_evals::{EvaluationManager, NewProviderApiKey, Provider};

#[derive(Args, Debug)]
pub struct ProvidersArgs {
    #[command(subcommand)]
    pub command: ProvidersCommands,
}

#[derive(Subcommand, Debug)]
pub enum ProvidersCommands {
    /// Store a provider API key. The first key of a workspace becomes its default.
    Create {
        /// Workspace id
        #[arg(long)]
        workspace: i64,
        /// Display name, referenced from prompt front matter
        #[arg(long)]
        name: String,
        /// Vendor: openai, anthropic, groq, mistral, azure, google or custom
        #[arg(long)]
        provider: String,
        /// API token
        #[arg(long)]
        token: String,
    },
}

pub async fn run(args: ProvidersArgs, manager: &EvaluationManager) -> Result<()> {
    match args.command {
        ProvidersCommands::Create {
            workspace,
            name,
            provider,
            token,
        } => {
            let provider: Provider = provider.parse()?;
            let key = manager
                .create_provider_api_key(NewProviderApiKey {
                    workspace_id: workspace,
                    name,
                    provider,
                    token,
                })
                .await?;
            super::print_json(&key)
        }
    }
}
