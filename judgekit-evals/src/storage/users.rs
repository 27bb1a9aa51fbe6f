//! User lookups and registration.

use chrono::Utc;
use libsql::Connection;
use tracing::instrument;

use super::{format_datetime, parse_datetime};
use crate::commands::NewUser;
use crate::error::{Error, Result};
use crate::workspace::User;

const USER_COLUMNS: &str = "id, email, name, created_at";

fn parse_user(row: &libsql::Row) -> Result<User> {
    let created_at: String = row.get(3)?;
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        created_at: parse_datetime(&created_at)?,
    })
}

/// Look up a user by id. A missing id matches nothing.
#[instrument(skip(conn), level = "debug")]
pub async fn get_user(conn: &Connection, id: Option<&str>) -> Result<Option<User>> {
    let Some(id) = id else {
        return Ok(None);
    };

    let mut rows = conn
        .query(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"),
            [id],
        )
        .await?;

    match rows.next().await? {
        Some(row) => Ok(Some(parse_user(&row)?)),
        None => Ok(None),
    }
}

/// Look up a user by id, failing with `NotFound` when absent.
pub async fn find_user(conn: &Connection, id: &str) -> Result<User> {
    get_user(conn, Some(id))
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))
}

/// Look up a user by email.
#[instrument(skip(conn), level = "debug")]
pub async fn find_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    let mut rows = conn
        .query(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"),
            [email],
        )
        .await?;

    match rows.next().await? {
        Some(row) => Ok(Some(parse_user(&row)?)),
        None => Ok(None),
    }
}

/// Register a user.
#[instrument(skip(conn, cmd), fields(id = %cmd.id), level = "debug")]
pub async fn create_user(conn: &Connection, cmd: NewUser) -> Result<User> {
    if find_user_by_email(conn, &cmd.email).await?.is_some() {
        return Err(Error::BadRequest(format!(
            "A user with email {} already exists",
            cmd.email
        )));
    }

    let user = User {
        id: cmd.id,
        email: cmd.email,
        name: cmd.name,
        created_at: Utc::now(),
    };

    conn.execute(
        "INSERT INTO users (id, email, name, created_at) VALUES (?, ?, ?, ?)",
        libsql::params![
            user.id.clone(),
            user.email.clone(),
            user.name.clone(),
            format_datetime(user.created_at)
        ],
    )
    .await?;

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    fn ada() -> NewUser {
        NewUser {
            id: "user-1".into(),
            email: "ada@example.com".into(),
            name: Some("Ada".into()),
        }
    }

    #[tokio::test]
    async fn missing_id_matches_nothing() {
        let db = Database::new_memory().await.unwrap();
        create_user(db.connection(), ada()).await.unwrap();

        assert!(get_user(db.connection(), None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn created_user_can_be_found() {
        let db = Database::new_memory().await.unwrap();
        let created = create_user(db.connection(), ada()).await.unwrap();

        let found = find_user(db.connection(), "user-1").await.unwrap();
        assert_eq!(found, created);
        assert_eq!(found.name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let db = Database::new_memory().await.unwrap();

        let err = find_user(db.connection(), "nobody").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(ref msg) if msg == "User not found"));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let db = Database::new_memory().await.unwrap();
        create_user(db.connection(), ada()).await.unwrap();

        let mut again = ada();
        again.id = "user-2".into();
        let err = create_user(db.connection(), again).await.unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }
}
