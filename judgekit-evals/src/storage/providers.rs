//! Provider API keys and the workspace default provider.

use chrono::Utc;
use libsql::Connection;
use tracing::{debug, instrument};

use super::{format_datetime, parse_datetime, workspaces};
use crate::commands::NewProviderApiKey;
use crate::error::{Error, Result};
use crate::types::{ProviderApiKeyId, WorkspaceId};
use crate::workspace::{ProviderApiKey, Workspace};

const PROVIDER_COLUMNS: &str = "id, workspace_id, name, provider, token, created_at";

fn parse_provider_api_key(row: &libsql::Row) -> Result<ProviderApiKey> {
    let provider: String = row.get(3)?;
    let created_at: String = row.get(5)?;
    Ok(ProviderApiKey {
        id: row.get(0)?,
        workspace_id: row.get(1)?,
        name: row.get(2)?,
        provider: provider
            .parse()
            .map_err(|_| Error::InvalidData(format!("invalid provider: {}", provider)))?,
        token: row.get(4)?,
        created_at: parse_datetime(&created_at)?,
    })
}

/// Store a provider key. The first key of a workspace becomes its default.
#[instrument(skip(conn, cmd), fields(workspace_id = cmd.workspace_id, provider = %cmd.provider), level = "debug")]
pub async fn create_provider_api_key(
    conn: &Connection,
    cmd: NewProviderApiKey,
) -> Result<ProviderApiKey> {
    let workspace = workspaces::find_workspace(conn, cmd.workspace_id).await?;

    let created_at = Utc::now();
    conn.execute(
        "INSERT INTO provider_api_keys (workspace_id, name, provider, token, created_at) VALUES (?, ?, ?, ?, ?)",
        libsql::params![
            cmd.workspace_id,
            cmd.name.clone(),
            cmd.provider.as_str(),
            cmd.token.clone(),
            format_datetime(created_at)
        ],
    )
    .await?;
    let id = conn.last_insert_rowid();

    if workspace.default_provider_id.is_none() {
        debug!(id, "promoting first provider key to workspace default");
        workspaces::set_default_provider(conn, workspace.id, id).await?;
    }

    Ok(ProviderApiKey {
        id,
        workspace_id: cmd.workspace_id,
        name: cmd.name,
        provider: cmd.provider,
        token: cmd.token,
        created_at,
    })
}

/// Look up a provider key within a workspace.
#[instrument(skip(conn), level = "debug")]
pub async fn find_provider_api_key(
    conn: &Connection,
    workspace_id: WorkspaceId,
    id: ProviderApiKeyId,
) -> Result<Option<ProviderApiKey>> {
    let mut rows = conn
        .query(
            &format!(
                "SELECT {PROVIDER_COLUMNS} FROM provider_api_keys WHERE id = ? AND workspace_id = ?"
            ),
            libsql::params![id, workspace_id],
        )
        .await?;

    match rows.next().await? {
        Some(row) => Ok(Some(parse_provider_api_key(&row)?)),
        None => Ok(None),
    }
}

/// The default provider key of a workspace, if one is configured.
pub async fn find_default_provider(
    conn: &Connection,
    workspace: &Workspace,
) -> Result<Option<ProviderApiKey>> {
    match workspace.default_provider_id {
        Some(id) => find_provider_api_key(conn, workspace.id, id).await,
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::NewWorkspace;
    use crate::storage::Database;
    use crate::workspace::Provider;

    fn key(workspace_id: WorkspaceId, name: &str, provider: Provider) -> NewProviderApiKey {
        NewProviderApiKey {
            workspace_id,
            name: name.into(),
            provider,
            token: "sk-test".into(),
        }
    }

    #[tokio::test]
    async fn first_key_becomes_workspace_default() {
        let db = Database::new_memory().await.unwrap();
        let conn = db.connection();
        let ws = workspaces::create_workspace(conn, NewWorkspace { name: "acme".into() })
            .await
            .unwrap();

        let first = create_provider_api_key(conn, key(ws.id, "openai", Provider::OpenAI))
            .await
            .unwrap();
        create_provider_api_key(conn, key(ws.id, "anthropic", Provider::Anthropic))
            .await
            .unwrap();

        let ws = workspaces::find_workspace(conn, ws.id).await.unwrap();
        assert_eq!(ws.default_provider_id, Some(first.id));

        let default = find_default_provider(conn, &ws).await.unwrap().unwrap();
        assert_eq!(default.provider, Provider::OpenAI);
        assert_eq!(default.token, "sk-test");
    }

    #[tokio::test]
    async fn workspace_without_keys_has_no_default() {
        let db = Database::new_memory().await.unwrap();
        let ws = workspaces::create_workspace(db.connection(), NewWorkspace { name: "acme".into() })
            .await
            .unwrap();

        assert!(find_default_provider(db.connection(), &ws).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn key_for_unknown_workspace_is_not_found() {
        let db = Database::new_memory().await.unwrap();
        let err = create_provider_api_key(db.connection(), key(9, "openai", Provider::OpenAI))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
