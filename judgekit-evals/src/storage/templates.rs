//! Evaluation template persistence.

use chrono::Utc;
use libsql::Connection;
use tracing::instrument;

use super::{format_datetime, parse_datetime};
use crate::commands::NewTemplate;
use crate::error::{Error, Result};
use crate::template::{EvaluationTemplate, TemplateConfiguration};
use crate::types::TemplateId;

const TEMPLATE_COLUMNS: &str = "id, name, description, prompt, configuration, created_at";

fn parse_template(row: &libsql::Row) -> Result<EvaluationTemplate> {
    let configuration: String = row.get(4)?;
    let created_at: String = row.get(5)?;
    Ok(EvaluationTemplate {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        prompt: row.get(3)?,
        configuration: serde_json::from_str::<TemplateConfiguration>(&configuration)?,
        created_at: parse_datetime(&created_at)?,
    })
}

/// Store a template.
#[instrument(skip(conn, cmd), fields(name = %cmd.name), level = "debug")]
pub async fn create_template(conn: &Connection, cmd: NewTemplate) -> Result<EvaluationTemplate> {
    // Fail at write time rather than on import.
    cmd.configuration.derive_result_configuration()?;

    let created_at = Utc::now();
    conn.execute(
        "INSERT INTO evaluation_templates (name, description, prompt, configuration, created_at) VALUES (?, ?, ?, ?, ?)",
        libsql::params![
            cmd.name.clone(),
            cmd.description.clone(),
            cmd.prompt.clone(),
            serde_json::to_string(&cmd.configuration)?,
            format_datetime(created_at)
        ],
    )
    .await?;

    Ok(EvaluationTemplate {
        id: conn.last_insert_rowid(),
        name: cmd.name,
        description: cmd.description,
        prompt: cmd.prompt,
        configuration: cmd.configuration,
        created_at,
    })
}

/// Look up a template, failing with `NotFound` when absent.
#[instrument(skip(conn), level = "debug")]
pub async fn find_template_by_id(conn: &Connection, id: TemplateId) -> Result<EvaluationTemplate> {
    let mut rows = conn
        .query(
            &format!("SELECT {TEMPLATE_COLUMNS} FROM evaluation_templates WHERE id = ?"),
            [id],
        )
        .await?;

    match rows.next().await? {
        Some(row) => parse_template(&row),
        None => Err(Error::NotFound("Evaluation template not found".to_string())),
    }
}

/// List all templates, oldest first.
#[instrument(skip(conn), level = "debug")]
pub async fn list_templates(conn: &Connection) -> Result<Vec<EvaluationTemplate>> {
    let mut rows = conn
        .query(
            &format!("SELECT {TEMPLATE_COLUMNS} FROM evaluation_templates ORDER BY id ASC"),
            (),
        )
        .await?;

    let mut templates = Vec::new();
    while let Some(row) = rows.next().await? {
        templates.push(parse_template(&row)?);
    }
    Ok(templates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::ResultType;
    use crate::storage::Database;

    fn factuality() -> NewTemplate {
        NewTemplate {
            name: "Factuality".into(),
            description: "Scores factual accuracy".into(),
            prompt: "Rate the factuality of {{response}}".into(),
            configuration: TemplateConfiguration::number(1.0, 5.0),
        }
    }

    #[tokio::test]
    async fn created_template_round_trips_configuration() {
        let db = Database::new_memory().await.unwrap();
        let created = create_template(db.connection(), factuality()).await.unwrap();

        let found = find_template_by_id(db.connection(), created.id).await.unwrap();
        assert_eq!(found, created);
        assert_eq!(found.configuration, TemplateConfiguration::number(1.0, 5.0));

        let all = list_templates(db.connection()).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn missing_template_is_not_found() {
        let db = Database::new_memory().await.unwrap();
        let err = find_template_by_id(db.connection(), 99).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(ref msg) if msg == "Evaluation template not found"));
    }

    #[tokio::test]
    async fn numeric_template_without_range_is_rejected() {
        let db = Database::new_memory().await.unwrap();
        let mut template = factuality();
        template.configuration = TemplateConfiguration::plain(ResultType::Number);

        let err = create_template(db.connection(), template).await.unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
        assert!(list_templates(db.connection()).await.unwrap().is_empty());
    }
}
