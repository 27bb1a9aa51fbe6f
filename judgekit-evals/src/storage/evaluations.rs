//! Evaluation rows and their metadata/configuration variant tables.
//!
//! Each variant lives in its own table. Which table a row goes to is decided
//! by matching on the typed input, never by looking a name up at runtime.

use chrono::Utc;
use libsql::Connection;
use serde_json::Value;
use tracing::instrument;
use uuid::Uuid;

use super::{format_datetime, parse_datetime};
use crate::configuration::{
    BooleanConfiguration, NumericalConfiguration, ResultConfiguration, ResultConfigurationInput,
    TextConfiguration,
};
use crate::error::{Error, Result};
use crate::evaluation::{Evaluation, EvaluationDto, MetadataType, ResultType};
use crate::metadata::{
    EvaluationMetadata, LlmAsJudgeAdvancedMetadata, LlmAsJudgeSimpleMetadata, MetadataInput,
};
use crate::types::{WorkspaceId, new_evaluation_uuid};

const EVALUATION_COLUMNS: &str = "id, uuid, workspace_id, name, description, metadata_type, metadata_id, result_type, result_configuration_id, created_at, updated_at";

fn parse_evaluation(row: &libsql::Row) -> Result<Evaluation> {
    let uuid_str: String = row.get(1)?;
    let metadata_type_str: String = row.get(5)?;
    let result_type_str: String = row.get(7)?;
    let created_at_str: String = row.get(9)?;
    let updated_at_str: String = row.get(10)?;

    let uuid = Uuid::parse_str(&uuid_str)
        .map_err(|_| Error::InvalidData(format!("invalid evaluation uuid: {}", uuid_str)))?;
    let metadata_type: MetadataType = metadata_type_str.parse().map_err(|_| {
        Error::InvalidData(format!("invalid metadata type: {}", metadata_type_str))
    })?;
    let result_type: ResultType = result_type_str
        .parse()
        .map_err(|_| Error::InvalidData(format!("invalid result type: {}", result_type_str)))?;

    Ok(Evaluation {
        id: row.get(0)?,
        uuid,
        workspace_id: row.get(2)?,
        name: row.get(3)?,
        description: row.get(4)?,
        metadata_type,
        metadata_id: row.get(6)?,
        result_type,
        result_configuration_id: row.get(8)?,
        created_at: parse_datetime(&created_at_str)?,
        updated_at: parse_datetime(&updated_at_str)?,
    })
}

/// Insert the metadata row into the table matching its variant.
#[instrument(skip_all, fields(metadata_type = %input.metadata_type()), level = "debug")]
pub async fn insert_metadata(conn: &Connection, input: &MetadataInput) -> Result<EvaluationMetadata> {
    match input {
        MetadataInput::LlmAsJudgeSimple(m) => {
            conn.execute(
                "INSERT INTO llm_as_judge_simple_evaluation_metadatas (provider_api_key_id, model, objective, additional_instructions) VALUES (?, ?, ?, ?)",
                libsql::params![
                    m.provider_api_key_id,
                    m.model.clone(),
                    m.objective.clone(),
                    m.additional_instructions.clone()
                ],
            )
            .await?;

            Ok(EvaluationMetadata::LlmAsJudgeSimple(LlmAsJudgeSimpleMetadata {
                id: conn.last_insert_rowid(),
                provider_api_key_id: m.provider_api_key_id,
                model: m.model.clone(),
                objective: m.objective.clone(),
                additional_instructions: m.additional_instructions.clone(),
            }))
        }
        MetadataInput::LlmAsJudgeAdvanced(m) => {
            let configuration = m
                .configuration
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;

            conn.execute(
                "INSERT INTO llm_as_judge_advanced_evaluation_metadatas (prompt, template_id, configuration) VALUES (?, ?, ?)",
                libsql::params![m.prompt.clone(), m.template_id, configuration],
            )
            .await?;

            Ok(EvaluationMetadata::LlmAsJudgeAdvanced(LlmAsJudgeAdvancedMetadata {
                id: conn.last_insert_rowid(),
                prompt: m.prompt.clone(),
                template_id: m.template_id,
                configuration: m.configuration.clone(),
            }))
        }
    }
}

/// Insert the configuration row into the table matching its variant.
#[instrument(skip_all, fields(result_type = %input.result_type()), level = "debug")]
pub async fn insert_result_configuration(
    conn: &Connection,
    input: &ResultConfigurationInput,
) -> Result<ResultConfiguration> {
    match input {
        ResultConfigurationInput::Boolean(c) => {
            conn.execute(
                "INSERT INTO evaluation_configuration_boolean (true_value_description, false_value_description) VALUES (?, ?)",
                libsql::params![
                    c.true_value_description.clone(),
                    c.false_value_description.clone()
                ],
            )
            .await?;

            Ok(ResultConfiguration::Boolean(BooleanConfiguration {
                id: conn.last_insert_rowid(),
                true_value_description: c.true_value_description.clone(),
                false_value_description: c.false_value_description.clone(),
            }))
        }
        ResultConfigurationInput::Number(c) => {
            conn.execute(
                "INSERT INTO evaluation_configuration_numerical (min_value, max_value, min_value_description, max_value_description) VALUES (?, ?, ?, ?)",
                libsql::params![
                    c.min_value,
                    c.max_value,
                    c.min_value_description.clone(),
                    c.max_value_description.clone()
                ],
            )
            .await?;

            Ok(ResultConfiguration::Number(NumericalConfiguration {
                id: conn.last_insert_rowid(),
                min_value: c.min_value,
                max_value: c.max_value,
                min_value_description: c.min_value_description.clone(),
                max_value_description: c.max_value_description.clone(),
            }))
        }
        ResultConfigurationInput::Text(c) => {
            conn.execute(
                "INSERT INTO evaluation_configuration_text (value_description) VALUES (?)",
                libsql::params![c.value_description.clone()],
            )
            .await?;

            Ok(ResultConfiguration::Text(TextConfiguration {
                id: conn.last_insert_rowid(),
                value_description: c.value_description.clone(),
            }))
        }
    }
}

/// Insert the evaluation row pointing at already inserted variant rows.
#[instrument(skip(conn, description, metadata, result_configuration), level = "debug")]
pub async fn insert_evaluation(
    conn: &Connection,
    workspace_id: WorkspaceId,
    name: &str,
    description: &str,
    metadata: &EvaluationMetadata,
    result_configuration: &ResultConfiguration,
) -> Result<Evaluation> {
    let now = Utc::now();
    let uuid = new_evaluation_uuid();

    conn.execute(
        "INSERT INTO evaluations (uuid, workspace_id, name, description, metadata_type, metadata_id, result_type, result_configuration_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        libsql::params![
            uuid.to_string(),
            workspace_id,
            name,
            description,
            metadata.metadata_type().as_str(),
            metadata.id(),
            result_configuration.result_type().as_str(),
            result_configuration.id(),
            format_datetime(now),
            format_datetime(now)
        ],
    )
    .await?;

    Ok(Evaluation {
        id: conn.last_insert_rowid(),
        uuid,
        workspace_id,
        name: name.to_string(),
        description: description.to_string(),
        metadata_type: metadata.metadata_type(),
        metadata_id: metadata.id(),
        result_type: result_configuration.result_type(),
        result_configuration_id: result_configuration.id(),
        created_at: now,
        updated_at: now,
    })
}

/// Look up an evaluation of a workspace by its external uuid.
#[instrument(skip(conn), level = "debug")]
pub async fn find_evaluation_by_uuid(
    conn: &Connection,
    workspace_id: WorkspaceId,
    uuid: Uuid,
) -> Result<Option<Evaluation>> {
    let mut rows = conn
        .query(
            &format!("SELECT {EVALUATION_COLUMNS} FROM evaluations WHERE uuid = ? AND workspace_id = ?"),
            libsql::params![uuid.to_string(), workspace_id],
        )
        .await?;

    match rows.next().await? {
        Some(row) => Ok(Some(parse_evaluation(&row)?)),
        None => Ok(None),
    }
}

/// List the evaluations of a workspace, newest first.
#[instrument(skip(conn), level = "debug")]
pub async fn list_evaluations(conn: &Connection, workspace_id: WorkspaceId) -> Result<Vec<Evaluation>> {
    let mut rows = conn
        .query(
            &format!(
                "SELECT {EVALUATION_COLUMNS} FROM evaluations WHERE workspace_id = ? ORDER BY created_at DESC, id DESC"
            ),
            [workspace_id],
        )
        .await?;

    let mut evaluations = Vec::new();
    while let Some(row) = rows.next().await? {
        evaluations.push(parse_evaluation(&row)?);
    }
    Ok(evaluations)
}

/// Load the metadata row an evaluation points at.
#[instrument(skip(conn), level = "debug")]
pub async fn load_metadata(
    conn: &Connection,
    metadata_type: MetadataType,
    id: i64,
) -> Result<EvaluationMetadata> {
    let missing = || Error::InvalidData(format!("missing {} metadata row {}", metadata_type, id));

    match metadata_type {
        MetadataType::LlmAsJudgeSimple => {
            let mut rows = conn
                .query(
                    "SELECT id, provider_api_key_id, model, objective, additional_instructions FROM llm_as_judge_simple_evaluation_metadatas WHERE id = ?",
                    [id],
                )
                .await?;
            let row = rows.next().await?.ok_or_else(missing)?;

            Ok(EvaluationMetadata::LlmAsJudgeSimple(LlmAsJudgeSimpleMetadata {
                id: row.get(0)?,
                provider_api_key_id: row.get(1)?,
                model: row.get(2)?,
                objective: row.get(3)?,
                additional_instructions: row.get(4)?,
            }))
        }
        MetadataType::LlmAsJudgeAdvanced => {
            let mut rows = conn
                .query(
                    "SELECT id, prompt, template_id, configuration FROM llm_as_judge_advanced_evaluation_metadatas WHERE id = ?",
                    [id],
                )
                .await?;
            let row = rows.next().await?.ok_or_else(missing)?;
            let configuration: Option<String> = row.get(3)?;

            Ok(EvaluationMetadata::LlmAsJudgeAdvanced(LlmAsJudgeAdvancedMetadata {
                id: row.get(0)?,
                prompt: row.get(1)?,
                template_id: row.get(2)?,
                configuration: configuration
                    .as_deref()
                    .map(serde_json::from_str::<Value>)
                    .transpose()?,
            }))
        }
    }
}

/// Load the configuration row an evaluation points at.
#[instrument(skip(conn), level = "debug")]
pub async fn load_result_configuration(
    conn: &Connection,
    result_type: ResultType,
    id: i64,
) -> Result<ResultConfiguration> {
    let missing = || Error::InvalidData(format!("missing {} configuration row {}", result_type, id));

    match result_type {
        ResultType::Boolean => {
            let mut rows = conn
                .query(
                    "SELECT id, true_value_description, false_value_description FROM evaluation_configuration_boolean WHERE id = ?",
                    [id],
                )
                .await?;
            let row = rows.next().await?.ok_or_else(missing)?;

            Ok(ResultConfiguration::Boolean(BooleanConfiguration {
                id: row.get(0)?,
                true_value_description: row.get(1)?,
                false_value_description: row.get(2)?,
            }))
        }
        ResultType::Number => {
            let mut rows = conn
                .query(
                    "SELECT id, min_value, max_value, min_value_description, max_value_description FROM evaluation_configuration_numerical WHERE id = ?",
                    [id],
                )
                .await?;
            let row = rows.next().await?.ok_or_else(missing)?;

            Ok(ResultConfiguration::Number(NumericalConfiguration {
                id: row.get(0)?,
                min_value: row.get(1)?,
                max_value: row.get(2)?,
                min_value_description: row.get(3)?,
                max_value_description: row.get(4)?,
            }))
        }
        ResultType::Text => {
            let mut rows = conn
                .query(
                    "SELECT id, value_description FROM evaluation_configuration_text WHERE id = ?",
                    [id],
                )
                .await?;
            let row = rows.next().await?.ok_or_else(missing)?;

            Ok(ResultConfiguration::Text(TextConfiguration {
                id: row.get(0)?,
                value_description: row.get(1)?,
            }))
        }
    }
}

/// Re-assemble an evaluation with its nested variants.
pub async fn assemble_dto(conn: &Connection, evaluation: Evaluation) -> Result<EvaluationDto> {
    let metadata = load_metadata(conn, evaluation.metadata_type, evaluation.metadata_id).await?;
    let result_configuration = load_result_configuration(
        conn,
        evaluation.result_type,
        evaluation.result_configuration_id,
    )
    .await?;

    Ok(EvaluationDto {
        evaluation,
        metadata,
        result_configuration,
    })
}

/// Look up an evaluation of a workspace with its nested variants.
pub async fn find_evaluation_dto(
    conn: &Connection,
    workspace_id: WorkspaceId,
    uuid: Uuid,
) -> Result<EvaluationDto> {
    let evaluation = find_evaluation_by_uuid(conn, workspace_id, uuid)
        .await?
        .ok_or_else(|| Error::NotFound("Evaluation not found".to_string()))?;
    assemble_dto(conn, evaluation).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::NewWorkspace;
    use crate::configuration::NumericalConfigurationInput;
    use crate::metadata::SimpleMetadataInput;
    use crate::storage::{Database, workspaces};

    async fn setup() -> (Database, WorkspaceId) {
        let db = Database::new_memory().await.unwrap();
        let ws = workspaces::create_workspace(db.connection(), NewWorkspace { name: "acme".into() })
            .await
            .unwrap();
        (db, ws.id)
    }

    fn simple_metadata() -> MetadataInput {
        MetadataInput::LlmAsJudgeSimple(SimpleMetadataInput {
            provider_api_key_id: None,
            model: Some("gpt-4o-mini".into()),
            objective: "Is the answer correct?".into(),
            additional_instructions: None,
        })
    }

    #[tokio::test]
    async fn inserted_rows_reassemble_into_dto() {
        let (db, workspace_id) = setup().await;
        let conn = db.connection();

        let metadata = insert_metadata(conn, &simple_metadata()).await.unwrap();
        let config = insert_result_configuration(
            conn,
            &ResultConfigurationInput::Number(NumericalConfigurationInput::range(1.0, 5.0)),
        )
        .await
        .unwrap();
        let evaluation = insert_evaluation(conn, workspace_id, "Accuracy", "", &metadata, &config)
            .await
            .unwrap();

        let dto = find_evaluation_dto(conn, workspace_id, evaluation.uuid)
            .await
            .unwrap();
        assert_eq!(dto.evaluation, evaluation);
        assert_eq!(dto.metadata, metadata);
        assert_eq!(dto.result_configuration, config);
        assert_eq!(dto.result_type(), ResultType::Number);
    }

    #[tokio::test]
    async fn evaluations_are_scoped_to_their_workspace() {
        let (db, workspace_id) = setup().await;
        let conn = db.connection();

        let metadata = insert_metadata(conn, &simple_metadata()).await.unwrap();
        let config = insert_result_configuration(
            conn,
            &ResultConfigurationInput::Number(NumericalConfigurationInput::range(0.0, 1.0)),
        )
        .await
        .unwrap();
        let evaluation = insert_evaluation(conn, workspace_id, "Accuracy", "", &metadata, &config)
            .await
            .unwrap();

        assert_eq!(list_evaluations(conn, workspace_id).await.unwrap().len(), 1);
        assert!(list_evaluations(conn, workspace_id + 1).await.unwrap().is_empty());

        let err = find_evaluation_dto(conn, workspace_id + 1, evaluation.uuid)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn storage_rejects_inverted_numeric_range() {
        let (db, _) = setup().await;
        let result = insert_result_configuration(
            db.connection(),
            &ResultConfigurationInput::Number(NumericalConfigurationInput::range(5.0, 1.0)),
        )
        .await;
        assert!(matches!(result, Err(Error::Database(_))));
    }
}
