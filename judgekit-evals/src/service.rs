//! Evaluation creation workflows.
//!
//! Every workflow runs inside a caller-supplied [`UnitOfWork`]. Workflows
//! never commit; they write, buffer their events on the unit of work and
//! return. Committing (or rolling back) is the caller's job.

use tracing::{debug, instrument};

use crate::commands::{CreateAdvancedEvaluation, CreateEvaluation, ImportTemplate};
use crate::configuration::validate_result_configuration;
use crate::error::{Error, Result};
use crate::evaluation::EvaluationDto;
use crate::events::EvalEvent;
use crate::metadata::{AdvancedMetadataInput, MetadataInput};
use crate::storage::{UnitOfWork, documents, evaluations, providers, templates, workspaces};
use crate::workspace::ProviderApiKey;

const MISSING_PROVIDER: &str = "In order to create an evaluation you need to first create a provider API key from OpenAI or Anthropic";

/// Create an evaluation with its metadata and result configuration.
///
/// The configuration is validated before anything is written. When both a
/// project and a document are given the evaluation is linked to the
/// document; a failed link fails the whole unit of work.
#[instrument(skip_all, fields(
    workspace_id = cmd.workspace.id,
    metadata_type = %cmd.metadata.metadata_type(),
    result_type = %cmd.result_configuration.result_type(),
))]
pub async fn create_evaluation(uow: &mut UnitOfWork, cmd: CreateEvaluation) -> Result<EvaluationDto> {
    let result_configuration = validate_result_configuration(cmd.result_configuration.clone())?;

    if let MetadataInput::LlmAsJudgeSimple(ref simple) = cmd.metadata
        && let Some(key_id) = simple.provider_api_key_id
    {
        providers::find_provider_api_key(uow.conn(), cmd.workspace.id, key_id)
            .await?
            .ok_or_else(|| Error::NotFound("Provider API key not found".to_string()))?;
    }

    let metadata = evaluations::insert_metadata(uow.conn(), &cmd.metadata).await?;
    let configuration =
        evaluations::insert_result_configuration(uow.conn(), &result_configuration).await?;
    let evaluation = evaluations::insert_evaluation(
        uow.conn(),
        cmd.workspace.id,
        &cmd.name,
        &cmd.description,
        &metadata,
        &configuration,
    )
    .await?;
    debug!(evaluation_id = evaluation.id, uuid = %evaluation.uuid, "evaluation rows written");

    if let Some(document_uuid) = link_target(&cmd) {
        documents::connect_evaluations(
            uow,
            &cmd.workspace,
            document_uuid,
            &[evaluation.uuid],
            &cmd.user,
        )
        .await?;
    }

    uow.publish_later(EvalEvent::EvaluationCreated {
        evaluation: evaluation.clone(),
        workspace_id: cmd.workspace.id,
        user_email: cmd.user.email.clone(),
        project_id: cmd.project_id,
        document_uuid: cmd.document_uuid.clone(),
    });

    Ok(EvaluationDto {
        evaluation,
        metadata,
        result_configuration: configuration,
    })
}

/// Document to link a new evaluation to. A zero project id or a blank
/// document uuid counts as not supplied.
fn link_target(cmd: &CreateEvaluation) -> Option<&str> {
    let document_uuid = cmd.document_uuid.as_deref()?;
    match cmd.project_id {
        Some(project_id) if project_id != 0 && !document_uuid.trim().is_empty() => {
            Some(document_uuid)
        }
        _ => None,
    }
}

/// Create an advanced LLM-as-judge evaluation from a free-form prompt.
///
/// The workspace must have a default provider. Its name and first default
/// model are written as front matter ahead of the prompt.
#[instrument(skip_all, fields(workspace_id = cmd.workspace.id, template_id = ?cmd.template_id))]
pub async fn create_advanced_evaluation(
    uow: &mut UnitOfWork,
    cmd: CreateAdvancedEvaluation,
) -> Result<EvaluationDto> {
    // The caller's copy may predate the workspace's first provider key.
    let workspace = workspaces::find_workspace(uow.conn(), cmd.workspace.id).await?;
    let provider = providers::find_default_provider(uow.conn(), &workspace)
        .await?
        .ok_or_else(|| Error::NotFound(MISSING_PROVIDER.to_string()))?;

    let configuration_snapshot = serde_json::to_value(&cmd.result_configuration)?;
    let metadata = MetadataInput::LlmAsJudgeAdvanced(AdvancedMetadataInput {
        prompt: prompt_with_provider(&provider, &cmd.prompt),
        template_id: cmd.template_id,
        configuration: Some(configuration_snapshot),
    });

    create_evaluation(
        uow,
        CreateEvaluation {
            workspace,
            user: cmd.user,
            name: cmd.name,
            description: cmd.description,
            metadata,
            result_configuration: cmd.result_configuration,
            project_id: cmd.project_id,
            document_uuid: cmd.document_uuid,
        },
    )
    .await
}

/// Create an advanced LLM-as-judge evaluation from a stored template.
#[instrument(skip_all, fields(workspace_id = cmd.workspace.id, template_id = cmd.template_id))]
pub async fn import_llm_as_judge_evaluation(
    uow: &mut UnitOfWork,
    cmd: ImportTemplate,
) -> Result<EvaluationDto> {
    let template = templates::find_template_by_id(uow.conn(), cmd.template_id).await?;
    let result_configuration = template.configuration.derive_result_configuration()?;

    create_advanced_evaluation(
        uow,
        CreateAdvancedEvaluation {
            workspace: cmd.workspace,
            user: cmd.user,
            name: template.name,
            description: template.description,
            result_configuration,
            prompt: template.prompt,
            template_id: Some(template.id),
            project_id: None,
            document_uuid: None,
        },
    )
    .await
}

/// Prefix a prompt with front matter naming the provider and its first model.
///
/// Providers without default models get no `model:` line.
pub fn prompt_with_provider(provider: &ProviderApiKey, prompt: &str) -> String {
    let mut out = format!("---\nprovider: {}\n", provider.name);
    if let Some(model) = provider.provider.first_model() {
        out.push_str(&format!("model: {}\n", model));
    }
    out.push_str("---\n");
    out.push_str(prompt);
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::Provider;
    use chrono::Utc;

    fn key(name: &str, provider: Provider) -> ProviderApiKey {
        ProviderApiKey {
            id: 1,
            workspace_id: 1,
            name: name.into(),
            provider,
            token: "sk".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn front_matter_names_provider_and_first_model() {
        let prompt = prompt_with_provider(&key("my-openai", Provider::OpenAI), "\nJudge {{response}}\n\n");
        assert_eq!(
            prompt,
            "---\nprovider: my-openai\nmodel: gpt-4o-mini\n---\nJudge {{response}}"
        );
    }

    #[test]
    fn front_matter_omits_model_without_defaults() {
        let prompt = prompt_with_provider(&key("local", Provider::Custom), "Judge it");
        assert_eq!(prompt, "---\nprovider: local\n---\nJudge it");
    }
}
