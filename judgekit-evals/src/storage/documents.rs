//! Links between prompt documents and evaluations.

use chrono::{DateTime, Utc};
use libsql::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::turso::UnitOfWork;
use super::{evaluations, format_datetime, parse_datetime};
use crate::error::{Error, Result};
use crate::evaluation::Evaluation;
use crate::events::EvalEvent;
use crate::types::EvaluationId;
use crate::workspace::{User, Workspace};

/// A document-evaluation link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedEvaluation {
    pub id: i64,
    pub document_uuid: String,
    pub evaluation_id: EvaluationId,
    pub created_at: DateTime<Utc>,
}

fn parse_connected_evaluation(row: &libsql::Row) -> Result<ConnectedEvaluation> {
    let created_at: String = row.get(3)?;
    Ok(ConnectedEvaluation {
        id: row.get(0)?,
        document_uuid: row.get(1)?,
        evaluation_id: row.get(2)?,
        created_at: parse_datetime(&created_at)?,
    })
}

/// Link evaluations of a workspace to a document.
///
/// Every uuid must resolve to an evaluation of `workspace`, otherwise nothing
/// is linked. Existing links are left alone. Returns the links this call
/// created and buffers an `EvaluationsConnected` event when there are any.
#[instrument(skip(uow, workspace, user), fields(workspace_id = workspace.id, count = evaluation_uuids.len()))]
pub async fn connect_evaluations(
    uow: &mut UnitOfWork,
    workspace: &Workspace,
    document_uuid: &str,
    evaluation_uuids: &[Uuid],
    user: &User,
) -> Result<Vec<ConnectedEvaluation>> {
    if document_uuid.trim().is_empty() {
        return Err(Error::BadRequest("Document uuid is required".to_string()));
    }

    let mut resolved: Vec<Evaluation> = Vec::with_capacity(evaluation_uuids.len());
    for uuid in evaluation_uuids {
        let evaluation = evaluations::find_evaluation_by_uuid(uow.conn(), workspace.id, *uuid)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Evaluation {} not found", uuid)))?;
        resolved.push(evaluation);
    }

    let mut created = Vec::new();
    for evaluation in &resolved {
        let created_at = Utc::now();
        let inserted = uow
            .conn()
            .execute(
                "INSERT OR IGNORE INTO connected_evaluations (document_uuid, evaluation_id, created_at) VALUES (?, ?, ?)",
                libsql::params![document_uuid, evaluation.id, format_datetime(created_at)],
            )
            .await?;

        if inserted == 0 {
            debug!(evaluation_id = evaluation.id, "evaluation already connected");
            continue;
        }

        created.push(ConnectedEvaluation {
            id: uow.conn().last_insert_rowid(),
            document_uuid: document_uuid.to_string(),
            evaluation_id: evaluation.id,
            created_at,
        });
    }

    if !created.is_empty() {
        uow.publish_later(EvalEvent::EvaluationsConnected {
            workspace_id: workspace.id,
            document_uuid: document_uuid.to_string(),
            evaluation_ids: created.iter().map(|c| c.evaluation_id).collect(),
            user_email: user.email.clone(),
        });
    }

    Ok(created)
}

/// Links of a document, oldest first.
#[instrument(skip(conn), level = "debug")]
pub async fn list_connected_evaluations(
    conn: &Connection,
    document_uuid: &str,
) -> Result<Vec<ConnectedEvaluation>> {
    let mut rows = conn
        .query(
            "SELECT id, document_uuid, evaluation_id, created_at FROM connected_evaluations WHERE document_uuid = ? ORDER BY id ASC",
            [document_uuid],
        )
        .await?;

    let mut links = Vec::new();
    while let Some(row) = rows.next().await? {
        links.push(parse_connected_evaluation(&row)?);
    }
    Ok(links)
}
