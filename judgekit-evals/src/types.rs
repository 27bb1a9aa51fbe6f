//! Identifier types shared across the crate.
//!
//! Rows use SQLite integer primary keys. Evaluations additionally carry a
//! stable external UUID, which is what documents link against.

use uuid::Uuid;

/// Primary key of a workspace.
pub type WorkspaceId = i64;

/// Primary key of an evaluation row.
pub type EvaluationId = i64;

/// Primary key of an evaluation template.
pub type TemplateId = i64;

/// Primary key of a provider API key.
pub type ProviderApiKeyId = i64;

/// Primary key of a project.
pub type ProjectId = i64;

/// User ids are opaque strings issued by the auth layer.
pub type UserId = String;

/// Generate a fresh external identifier for an evaluation.
#[must_use]
pub fn new_evaluation_uuid() -> Uuid {
    Uuid::new_v4()
}
