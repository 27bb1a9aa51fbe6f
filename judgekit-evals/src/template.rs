//! Predefined evaluation blueprints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::configuration::{
    BooleanConfigurationInput, NumericalConfigurationInput, ResultConfigurationInput,
    TextConfigurationInput,
};
use crate::error::{Error, Result};
use crate::evaluation::ResultType;
use crate::types::TemplateId;

/// Numeric score range declared by a template.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemplateRange {
    pub from: f64,
    pub to: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDetail {
    pub range: TemplateRange,
}

/// Result shape stored on a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateConfiguration {
    #[serde(rename = "type")]
    pub result_type: ResultType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<TemplateDetail>,
}

impl TemplateConfiguration {
    /// Configuration for a numeric template scoring `from..to`.
    #[must_use]
    pub fn number(from: f64, to: f64) -> Self {
        Self {
            result_type: ResultType::Number,
            detail: Some(TemplateDetail {
                range: TemplateRange { from, to },
            }),
        }
    }

    /// Configuration for a boolean or text template.
    #[must_use]
    pub fn plain(result_type: ResultType) -> Self {
        Self {
            result_type,
            detail: None,
        }
    }

    /// Derive the result configuration a new evaluation gets from this template.
    ///
    /// Numeric templates map their range onto `minValue`/`maxValue`; other
    /// types get an empty configuration.
    pub fn derive_result_configuration(&self) -> Result<ResultConfigurationInput> {
        match self.result_type {
            ResultType::Number => {
                let range = self.detail.as_ref().map(|d| d.range).ok_or_else(|| {
                    Error::BadRequest("Numeric evaluation template has no range".to_string())
                })?;
                Ok(ResultConfigurationInput::Number(
                    NumericalConfigurationInput::range(range.from, range.to),
                ))
            }
            ResultType::Boolean => Ok(ResultConfigurationInput::Boolean(
                BooleanConfigurationInput::default(),
            )),
            ResultType::Text => Ok(ResultConfigurationInput::Text(
                TextConfigurationInput::default(),
            )),
        }
    }
}

/// A stored evaluation template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationTemplate {
    pub id: TemplateId,
    pub name: String,
    pub description: String,
    pub prompt: String,
    pub configuration: TemplateConfiguration,
    pub created_at: DateTime<Utc>,
}
