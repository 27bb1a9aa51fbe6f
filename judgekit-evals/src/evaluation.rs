//! Evaluation rows and their discriminators.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::configuration::ResultConfiguration;
use crate::error::Error;
use crate::metadata::EvaluationMetadata;
use crate::types::{EvaluationId, WorkspaceId};

/// How an evaluation computes its score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetadataType {
    /// LLM judge driven by an objective and optional instructions.
    #[serde(rename = "llm_as_judge_simple")]
    LlmAsJudgeSimple,
    /// LLM judge driven by a full prompt document.
    #[serde(rename = "llm_as_judge")]
    LlmAsJudgeAdvanced,
}

impl MetadataType {
    /// Convert to the wire/database string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LlmAsJudgeSimple => "llm_as_judge_simple",
            Self::LlmAsJudgeAdvanced => "llm_as_judge",
        }
    }
}

impl FromStr for MetadataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "llm_as_judge_simple" => Ok(Self::LlmAsJudgeSimple),
            "llm_as_judge" => Ok(Self::LlmAsJudgeAdvanced),
            other => Err(Error::BadRequest(format!("Invalid metadata type {other}"))),
        }
    }
}

impl fmt::Display for MetadataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of the score an evaluation produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultType {
    #[serde(rename = "evaluation_resultable_boolean")]
    Boolean,
    #[serde(rename = "evaluation_resultable_number")]
    Number,
    #[serde(rename = "evaluation_resultable_text")]
    Text,
}

impl ResultType {
    /// Convert to the wire/database string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "evaluation_resultable_boolean",
            Self::Number => "evaluation_resultable_number",
            Self::Text => "evaluation_resultable_text",
        }
    }
}

impl FromStr for ResultType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "evaluation_resultable_boolean" => Ok(Self::Boolean),
            "evaluation_resultable_number" => Ok(Self::Number),
            "evaluation_resultable_text" => Ok(Self::Text),
            other => Err(Error::BadRequest(format!("Invalid result type {other}"))),
        }
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The core evaluation row.
///
/// `metadata_id` and `result_configuration_id` point into the variant tables
/// selected by `metadata_type` and `result_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub id: EvaluationId,
    pub uuid: Uuid,
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub description: String,
    pub metadata_type: MetadataType,
    pub metadata_id: i64,
    pub result_type: ResultType,
    pub result_configuration_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An evaluation together with its metadata and result configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationDto {
    #[serde(flatten)]
    pub evaluation: Evaluation,
    pub metadata: EvaluationMetadata,
    pub result_configuration: ResultConfiguration,
}

impl EvaluationDto {
    #[must_use]
    pub fn result_type(&self) -> ResultType {
        self.evaluation.result_type
    }

    #[must_use]
    pub fn metadata_type(&self) -> MetadataType {
        self.evaluation.metadata_type
    }
}
