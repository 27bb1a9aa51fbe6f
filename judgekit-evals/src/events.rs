//! Event types emitted by evaluation workflows.
//!
//! Events are buffered on the unit of work and handed to the publisher only
//! after the transaction commits, so a rolled-back write never produces one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::evaluation::Evaluation;
use crate::types::{EvaluationId, ProjectId, WorkspaceId};

/// Events for the evaluation system.
///
/// Serialized as an envelope with a `type` tag and a `data` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum EvalEvent {
    /// A new evaluation was created.
    EvaluationCreated {
        evaluation: Evaluation,
        workspace_id: WorkspaceId,
        user_email: String,
        project_id: Option<ProjectId>,
        document_uuid: Option<String>,
    },

    /// Evaluations were linked to a document.
    EvaluationsConnected {
        workspace_id: WorkspaceId,
        document_uuid: String,
        evaluation_ids: Vec<EvaluationId>,
        user_email: String,
    },
}

impl EvalEvent {
    /// Workspace the event belongs to.
    #[must_use]
    pub fn workspace_id(&self) -> WorkspaceId {
        match self {
            EvalEvent::EvaluationCreated { workspace_id, .. } => *workspace_id,
            EvalEvent::EvaluationsConnected { workspace_id, .. } => *workspace_id,
        }
    }
}

/// An EvalEvent with a globally unique UUIDv7 identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvalEvent {
    /// Globally unique, time-ordered event identifier (UUIDv7)
    pub event_id: Uuid,
    /// When the owning transaction committed.
    pub occurred_at: DateTime<Utc>,
    /// The event payload
    pub event: EvalEvent,
}

impl StoredEvalEvent {
    /// Create a new StoredEvalEvent with a fresh UUIDv7 identifier.
    #[must_use]
    pub fn new(event: EvalEvent) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            occurred_at: Utc::now(),
            event,
        }
    }

    #[must_use]
    pub fn workspace_id(&self) -> WorkspaceId {
        self.event.workspace_id()
    }
}
