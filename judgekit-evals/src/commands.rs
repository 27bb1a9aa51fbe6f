//! Command types for evaluation workflows.
//!
//! Commands carry everything a workflow needs, including the workspace and
//! acting user, so workflows never reach for ambient state.

use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::configuration::{ResultConfigurationInput, validate_result_configuration};
use crate::error::Result;
use crate::evaluation::{MetadataType, ResultType};
use crate::metadata::MetadataInput;
use crate::template::TemplateConfiguration;
use crate::types::{ProjectId, TemplateId, UserId, WorkspaceId};
use crate::workspace::{Provider, User, Workspace};

/// Command to create an evaluation with an explicit metadata variant.
#[derive(Debug, Clone)]
pub struct CreateEvaluation {
    pub workspace: Workspace,
    pub user: User,
    pub name: String,
    pub description: String,
    pub metadata: MetadataInput,
    pub result_configuration: ResultConfigurationInput,
    /// Project the linked document belongs to.
    pub project_id: Option<ProjectId>,
    /// Document to link the new evaluation to. Linking needs `project_id` too.
    pub document_uuid: Option<String>,
}

/// Untyped creation request, as received from an outer layer.
///
/// Discriminators are plain strings and payloads are raw JSON. Converting
/// into [`CreateEvaluation`] resolves both discriminators and decodes both
/// payloads, so unknown types are rejected before anything is written.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEvaluationRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub metadata_type: String,
    #[serde(default)]
    pub metadata: Value,
    pub result_type: String,
    #[serde(default)]
    pub result_configuration: Value,
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    #[serde(default)]
    pub document_uuid: Option<String>,
}

impl CreateEvaluationRequest {
    /// Resolve discriminators and decode payloads into a typed command.
    ///
    /// The result configuration is checked first, so an invalid numeric
    /// range is reported even when the metadata type is also wrong.
    pub fn into_command(self, workspace: Workspace, user: User) -> Result<CreateEvaluation> {
        let result_type: ResultType = self.result_type.parse()?;
        let result_configuration = validate_result_configuration(ResultConfigurationInput::decode(
            result_type,
            self.result_configuration,
        )?)?;

        let metadata_type: MetadataType = self.metadata_type.parse()?;
        let metadata = MetadataInput::decode(metadata_type, self.metadata)?;

        Ok(CreateEvaluation {
            workspace,
            user,
            name: self.name,
            description: self.description,
            metadata,
            result_configuration,
            project_id: self.project_id,
            document_uuid: self.document_uuid,
        })
    }
}

/// Command to create an advanced LLM-as-judge evaluation from a prompt.
#[derive(Debug, Clone)]
pub struct CreateAdvancedEvaluation {
    pub workspace: Workspace,
    pub user: User,
    pub name: String,
    pub description: String,
    pub result_configuration: ResultConfigurationInput,
    pub prompt: String,
    pub template_id: Option<TemplateId>,
    pub project_id: Option<ProjectId>,
    pub document_uuid: Option<String>,
}

/// Command to create an evaluation from a stored template.
#[derive(Debug, Clone)]
pub struct ImportTemplate {
    pub workspace: Workspace,
    pub user: User,
    pub template_id: TemplateId,
}

/// Command to link evaluations to a document.
#[derive(Debug, Clone)]
pub struct ConnectEvaluations {
    pub workspace: Workspace,
    pub user: User,
    pub document_uuid: String,
    pub evaluation_uuids: Vec<Uuid>,
}

/// Command to create a workspace.
#[derive(Debug, Clone)]
pub struct NewWorkspace {
    pub name: String,
}

/// Command to register a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
}

/// Command to store a provider API key in a workspace.
#[derive(Debug, Clone)]
pub struct NewProviderApiKey {
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub provider: Provider,
    pub token: String,
}

/// Command to store an evaluation template.
#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub name: String,
    pub description: String,
    pub prompt: String,
    pub configuration: TemplateConfiguration,
}
