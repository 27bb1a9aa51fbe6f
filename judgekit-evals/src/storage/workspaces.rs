//! Workspace persistence.

use chrono::Utc;
use libsql::Connection;
use tracing::instrument;

use super::{format_datetime, parse_datetime};
use crate::commands::NewWorkspace;
use crate::error::{Error, Result};
use crate::types::{ProviderApiKeyId, WorkspaceId};
use crate::workspace::Workspace;

fn parse_workspace(row: &libsql::Row) -> Result<Workspace> {
    let created_at: String = row.get(3)?;
    Ok(Workspace {
        id: row.get(0)?,
        name: row.get(1)?,
        default_provider_id: row.get(2)?,
        created_at: parse_datetime(&created_at)?,
    })
}

/// Create a workspace.
#[instrument(skip(conn), level = "debug")]
pub async fn create_workspace(conn: &Connection, cmd: NewWorkspace) -> Result<Workspace> {
    if cmd.name.trim().is_empty() {
        return Err(Error::BadRequest("Workspace name is required".to_string()));
    }

    let created_at = Utc::now();
    conn.execute(
        "INSERT INTO workspaces (name, created_at) VALUES (?, ?)",
        libsql::params![cmd.name.clone(), format_datetime(created_at)],
    )
    .await?;

    Ok(Workspace {
        id: conn.last_insert_rowid(),
        name: cmd.name,
        default_provider_id: None,
        created_at,
    })
}

/// Look up a workspace, failing with `NotFound` when absent.
#[instrument(skip(conn), level = "debug")]
pub async fn find_workspace(conn: &Connection, id: WorkspaceId) -> Result<Workspace> {
    let mut rows = conn
        .query(
            "SELECT id, name, default_provider_id, created_at FROM workspaces WHERE id = ?",
            [id],
        )
        .await?;

    match rows.next().await? {
        Some(row) => parse_workspace(&row),
        None => Err(Error::NotFound("Workspace not found".to_string())),
    }
}

/// Point a workspace at its default provider key.
#[instrument(skip(conn), level = "debug")]
pub async fn set_default_provider(
    conn: &Connection,
    workspace_id: WorkspaceId,
    provider_api_key_id: ProviderApiKeyId,
) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE workspaces SET default_provider_id = ? WHERE id = ?",
            libsql::params![provider_api_key_id, workspace_id],
        )
        .await?;

    if updated == 0 {
        return Err(Error::NotFound("Workspace not found".to_string()));
    }
    Ok(())
}
