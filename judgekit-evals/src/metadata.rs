//! Evaluation metadata variants.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::evaluation::MetadataType;
use crate::types::{ProviderApiKeyId, TemplateId};

/// Input for a simple LLM-as-judge evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SimpleMetadataInput {
    #[serde(default)]
    pub provider_api_key_id: Option<ProviderApiKeyId>,
    #[serde(default)]
    pub model: Option<String>,
    pub objective: String,
    #[serde(default)]
    pub additional_instructions: Option<String>,
}

/// Input for an advanced LLM-as-judge evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AdvancedMetadataInput {
    pub prompt: String,
    #[serde(default)]
    pub template_id: Option<TemplateId>,
    /// Snapshot of the result configuration the prompt was written against.
    #[serde(default)]
    pub configuration: Option<Value>,
}

/// Metadata to be written, one variant per [`MetadataType`].
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataInput {
    LlmAsJudgeSimple(SimpleMetadataInput),
    LlmAsJudgeAdvanced(AdvancedMetadataInput),
}

impl MetadataInput {
    #[must_use]
    pub fn metadata_type(&self) -> MetadataType {
        match self {
            Self::LlmAsJudgeSimple(_) => MetadataType::LlmAsJudgeSimple,
            Self::LlmAsJudgeAdvanced(_) => MetadataType::LlmAsJudgeAdvanced,
        }
    }

    /// Decode an untyped payload into the variant selected by `metadata_type`.
    pub fn decode(metadata_type: MetadataType, payload: Value) -> Result<Self> {
        let decoded = match metadata_type {
            MetadataType::LlmAsJudgeSimple => {
                serde_json::from_value(payload).map(Self::LlmAsJudgeSimple)
            }
            MetadataType::LlmAsJudgeAdvanced => {
                serde_json::from_value(payload).map(Self::LlmAsJudgeAdvanced)
            }
        };

        decoded.map_err(|e| Error::BadRequest(format!("Invalid {metadata_type} metadata: {e}")))
    }
}

/// Stored simple LLM-as-judge metadata row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmAsJudgeSimpleMetadata {
    pub id: i64,
    pub provider_api_key_id: Option<ProviderApiKeyId>,
    pub model: Option<String>,
    pub objective: String,
    pub additional_instructions: Option<String>,
}

/// Stored advanced LLM-as-judge metadata row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmAsJudgeAdvancedMetadata {
    pub id: i64,
    pub prompt: String,
    pub template_id: Option<TemplateId>,
    pub configuration: Option<Value>,
}

/// A stored metadata row of any variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EvaluationMetadata {
    LlmAsJudgeSimple(LlmAsJudgeSimpleMetadata),
    LlmAsJudgeAdvanced(LlmAsJudgeAdvancedMetadata),
}

impl EvaluationMetadata {
    #[must_use]
    pub fn id(&self) -> i64 {
        match self {
            Self::LlmAsJudgeSimple(m) => m.id,
            Self::LlmAsJudgeAdvanced(m) => m.id,
        }
    }

    #[must_use]
    pub fn metadata_type(&self) -> MetadataType {
        match self {
            Self::LlmAsJudgeSimple(_) => MetadataType::LlmAsJudgeSimple,
            Self::LlmAsJudgeAdvanced(_) => MetadataType::LlmAsJudgeAdvanced,
        }
    }

    /// The judge prompt, for advanced metadata.
    #[must_use]
    pub fn prompt(&self) -> Option<&str> {
        match self {
            Self::LlmAsJudgeSimple(_) => None,
            Self::LlmAsJudgeAdvanced(m) => Some(&m.prompt),
        }
    }
}
