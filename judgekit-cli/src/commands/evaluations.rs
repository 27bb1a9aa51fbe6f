//! Evaluation commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use judgekit_evals::{
    ConnectEvaluations, CreateAdvancedEvaluation, CreateEvaluationRequest, EvaluationManager,
    ResultConfigurationInput,
};
use tokio::io::AsyncReadExt;
use uuid::Uuid;

use super::{ResultKind, SessionArgs, parse_json_arg};

#[derive(Args, Debug)]
pub struct EvaluationsArgs {
    #[command(subcommand)]
    pub command: EvaluationsCommands,
}

#[derive(Subcommand, Debug)]
pub enum EvaluationsCommands {
    /// Create an evaluation from a request body or flags
    Create(CreateArgs),
    /// Create an advanced LLM-as-judge evaluation from a prompt
    CreateAdvanced(CreateAdvancedArgs),
    /// List the evaluations of a workspace
    List {
        /// Workspace id
        #[arg(long)]
        workspace: i64,
    },
    /// Show an evaluation with its metadata and result configuration
    Show {
        /// Workspace id
        #[arg(long)]
        workspace: i64,
        /// Evaluation uuid
        uuid: Uuid,
    },
    /// Link evaluations to a document
    Connect {
        #[command(flatten)]
        session: SessionArgs,
        /// Document uuid
        #[arg(long)]
        document: String,
        /// Evaluation uuids
        #[arg(required = true)]
        evaluations: Vec<Uuid>,
    },
    /// List the evaluations linked to a document
    Connected {
        /// Document uuid
        #[arg(long)]
        document: String,
    },
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// JSON request body file ("-" reads stdin). Overrides the other flags.
    #[arg(long)]
    pub request: Option<PathBuf>,

    #[arg(long, required_unless_present = "request")]
    pub name: Option<String>,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Metadata discriminator, e.g. llm_as_judge_simple
    #[arg(long, required_unless_present = "request")]
    pub metadata_type: Option<String>,

    /// Metadata payload as JSON
    #[arg(long)]
    pub metadata: Option<String>,

    /// Result discriminator, e.g. evaluation_resultable_boolean
    #[arg(long, required_unless_present = "request")]
    pub result_type: Option<String>,

    /// Result configuration payload as JSON
    #[arg(long)]
    pub result_configuration: Option<String>,

    #[arg(long)]
    pub project_id: Option<i64>,

    #[arg(long)]
    pub document_uuid: Option<String>,
}

#[derive(Args, Debug)]
pub struct CreateAdvancedArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    #[arg(long)]
    pub name: String,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Judge prompt, without front matter
    #[arg(long)]
    pub prompt: String,

    /// Result shape
    #[arg(long = "type", value_enum)]
    pub kind: ResultKind,

    /// Result configuration payload as JSON
    #[arg(long)]
    pub result_configuration: Option<String>,

    #[arg(long)]
    pub project_id: Option<i64>,

    #[arg(long)]
    pub document_uuid: Option<String>,
}

pub async fn run(args: EvaluationsArgs, manager: &EvaluationManager) -> Result<()> {
    match args.command {
        EvaluationsCommands::Create(args) => create(args, manager).await,
        EvaluationsCommands::CreateAdvanced(args) => create_advanced(args, manager).await,
        EvaluationsCommands::List { workspace } => {
            super::print_json(&manager.list_evaluations(workspace).await?)
        }
        EvaluationsCommands::Show { workspace, uuid } => {
            super::print_json(&manager.find_evaluation(workspace, uuid).await?)
        }
        EvaluationsCommands::Connect {
            session,
            document,
            evaluations,
        } => {
            let (workspace, user) = session.resolve(manager).await?;
            let links = manager
                .connect_evaluations(ConnectEvaluations {
                    workspace,
                    user,
                    document_uuid: document,
                    evaluation_uuids: evaluations,
                })
                .await?;
            super::print_json(&links)
        }
        EvaluationsCommands::Connected { document } => {
            super::print_json(&manager.list_connected_evaluations(&document).await?)
        }
    }
}

async fn create(args: CreateArgs, manager: &EvaluationManager) -> Result<()> {
    let (workspace, user) = args.session.resolve(manager).await?;
    let request = match &args.request {
        Some(path) => read_request(path).await?,
        None => request_from_flags(&args)?,
    };
    let dto = manager
        .create_evaluation_from_request(request, workspace, user)
        .await?;
    super::print_json(&dto)
}

async fn create_advanced(args: CreateAdvancedArgs, manager: &EvaluationManager) -> Result<()> {
    let (workspace, user) = args.session.resolve(manager).await?;
    let payload = parse_json_arg(args.result_configuration.as_deref())?;
    let result_configuration = ResultConfigurationInput::decode(args.kind.into(), payload)?;

    let dto = manager
        .create_advanced_evaluation(CreateAdvancedEvaluation {
            workspace,
            user,
            name: args.name,
            description: args.description,
            result_configuration,
            prompt: args.prompt,
            template_id: None,
            project_id: args.project_id,
            document_uuid: args.document_uuid,
        })
        .await?;
    super::print_json(&dto)
}

async fn read_request(path: &Path) -> Result<CreateEvaluationRequest> {
    let body = if path == Path::new("-") {
        let mut body = String::new();
        tokio::io::stdin().read_to_string(&mut body).await?;
        body
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?
    };
    serde_json::from_str(&body).context("invalid evaluation request")
}

fn request_from_flags(args: &CreateArgs) -> Result<CreateEvaluationRequest> {
    let (Some(name), Some(metadata_type), Some(result_type)) =
        (&args.name, &args.metadata_type, &args.result_type)
    else {
        bail!("--name, --metadata-type and --result-type are required without --request");
    };

    Ok(CreateEvaluationRequest {
        name: name.clone(),
        description: args.description.clone(),
        metadata_type: metadata_type.clone(),
        metadata: parse_json_arg(args.metadata.as_deref())?,
        result_type: result_type.clone(),
        result_configuration: parse_json_arg(args.result_configuration.as_deref())?,
        project_id: args.project_id,
        document_uuid: args.document_uuid.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(name: Option<&str>) -> CreateArgs {
        CreateArgs {
            session: SessionArgs {
                workspace: 1,
                user: "user-1".to_string(),
            },
            request: None,
            name: name.map(str::to_string),
            description: String::new(),
            metadata_type: Some("llm_as_judge_simple".to_string()),
            metadata: Some(r#"{"objective": "Is the reply polite?"}"#.to_string()),
            result_type: Some("evaluation_resultable_boolean".to_string()),
            result_configuration: None,
            project_id: None,
            document_uuid: None,
        }
    }

    #[test]
    fn request_from_flags_passes_discriminators_through() {
        let request = request_from_flags(&args(Some("Tone Check"))).unwrap();

        assert_eq!(request.name, "Tone Check");
        assert_eq!(request.metadata_type, "llm_as_judge_simple");
        assert_eq!(request.metadata["objective"], "Is the reply polite?");
        assert!(request.result_configuration.is_null());
    }

    #[test]
    fn request_from_flags_requires_name() {
        assert!(request_from_flags(&args(None)).is_err());
    }

    #[tokio::test]
    async fn read_request_parses_camel_case_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("request.json");
        std::fs::write(
            &path,
            r#"{
                "name": "Score",
                "metadataType": "llm_as_judge_simple",
                "metadata": {"objective": "Rate it"},
                "resultType": "evaluation_resultable_number",
                "resultConfiguration": {"minValue": 1, "maxValue": 5},
                "projectId": 3,
                "documentUuid": "doc-1"
            }"#,
        )
        .unwrap();

        let request = read_request(&path).await.unwrap();

        assert_eq!(request.result_type, "evaluation_resultable_number");
        assert_eq!(request.project_id, Some(3));
        assert_eq!(request.document_uuid.as_deref(), Some("doc-1"));
    }
}
