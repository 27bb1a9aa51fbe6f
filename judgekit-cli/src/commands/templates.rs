use anyhow::Result;
use clap::{Args, Subcommand};
use judgekit_evals::{
    EvaluationManager, ImportTemplate, NewTemplate, ResultType, TemplateConfiguration,
};

use super::{ResultKind, SessionArgs};

#[derive(Args, Debug)]
pub struct TemplatesArgs {
    #[command(subcommand)]
    pub command: TemplatesCommands,
}

#[derive(Subcommand, Debug)]
pub enum TemplatesCommands {
    /// Store an evaluation template
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Judge prompt
        #[arg(long)]
        prompt: String,
        /// Result shape
        #[arg(long = "type", value_enum)]
        kind: ResultKind,
        /// Lowest score (number templates)
        #[arg(long, requires = "to")]
        from: Option<f64>,
        /// Highest score (number templates)
        #[arg(long, requires = "from")]
        to: Option<f64>,
    },
    /// List templates
    List,
    /// Create an evaluation from a template
    Import {
        #[command(flatten)]
        session: SessionArgs,
        /// Template id
        #[arg(long)]
        template: i64,
    },
}

pub async fn run(args: TemplatesArgs, manager: &EvaluationManager) -> Result<()> {
    match args.command {
        TemplatesCommands::Create {
            name,
            description,
            prompt,
            kind,
            from,
            to,
        } => {
            let configuration = template_configuration(kind, from, to);
            let template = manager
                .create_template(NewTemplate {
                    name,
                    description,
                    prompt,
                    configuration,
                })
                .await?;
            super::print_json(&template)
        }
        TemplatesCommands::List => super::print_json(&manager.list_templates().await?),
        TemplatesCommands::Import { session, template } => {
            let (workspace, user) = session.resolve(manager).await?;
            let dto = manager
                .import_template(ImportTemplate {
                    workspace,
                    user,
                    template_id: template,
                })
                .await?;
            super::print_json(&dto)
        }
    }
}

/// A range is only attached when both bounds are given; a number template
/// without one is rejected when stored.
fn template_configuration(
    kind: ResultKind,
    from: Option<f64>,
    to: Option<f64>,
) -> TemplateConfiguration {
    match (ResultType::from(kind), from, to) {
        (ResultType::Number, Some(from), Some(to)) => TemplateConfiguration::number(from, to),
        (result_type, _, _) => TemplateConfiguration::plain(result_type),
    }
}
