//! Result configuration variants and their validation.
//!
//! Each evaluation owns exactly one configuration row in the table that
//! matches its [`ResultType`]. Inputs are decoded from untyped JSON at the
//! boundary; decoding is where structural checks happen (unknown fields,
//! wrong types, missing bounds). [`validate_result_configuration`] adds the
//! semantic range check for numeric scores.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::evaluation::ResultType;

/// Input for a boolean result configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BooleanConfigurationInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub true_value_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub false_value_description: Option<String>,
}

/// Input for a numeric result configuration. Both bounds are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NumericalConfigurationInput {
    pub min_value: f64,
    pub max_value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value_description: Option<String>,
}

impl NumericalConfigurationInput {
    #[must_use]
    pub fn range(min_value: f64, max_value: f64) -> Self {
        Self {
            min_value,
            max_value,
            min_value_description: None,
            max_value_description: None,
        }
    }
}

/// Input for a text result configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TextConfigurationInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_description: Option<String>,
}

/// A result configuration to be written, one variant per [`ResultType`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultConfigurationInput {
    Boolean(BooleanConfigurationInput),
    Number(NumericalConfigurationInput),
    Text(TextConfigurationInput),
}

impl ResultConfigurationInput {
    /// The discriminator this input belongs to.
    #[must_use]
    pub fn result_type(&self) -> ResultType {
        match self {
            Self::Boolean(_) => ResultType::Boolean,
            Self::Number(_) => ResultType::Number,
            Self::Text(_) => ResultType::Text,
        }
    }

    /// Decode an untyped payload into the variant selected by `result_type`.
    ///
    /// `null` is accepted as an empty object.
    pub fn decode(result_type: ResultType, payload: Value) -> Result<Self> {
        let payload = match payload {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };

        let decoded = match result_type {
            ResultType::Boolean => serde_json::from_value(payload).map(Self::Boolean),
            ResultType::Number => serde_json::from_value(payload).map(Self::Number),
            ResultType::Text => serde_json::from_value(payload).map(Self::Text),
        };

        decoded.map_err(|e| {
            Error::BadRequest(format!("Invalid {result_type} configuration: {e}"))
        })
    }
}

/// Check a result configuration against its declared type.
///
/// Only numeric configurations carry a semantic rule: the minimum must be
/// strictly below the maximum. Returns the input unchanged when valid.
#[allow(clippy::neg_cmp_op_on_partial_ord)]
pub fn validate_result_configuration(
    config: ResultConfigurationInput,
) -> Result<ResultConfigurationInput> {
    if let ResultConfigurationInput::Number(ref numeric) = config {
        // Written as a negation so NaN bounds are rejected too.
        if !(numeric.min_value < numeric.max_value) {
            return Err(Error::BadRequest(
                "Invalid range min value has to be less than max value".to_string(),
            ));
        }
    }
    Ok(config)
}

/// Stored boolean configuration row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BooleanConfiguration {
    pub id: i64,
    pub true_value_description: Option<String>,
    pub false_value_description: Option<String>,
}

/// Stored numeric configuration row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericalConfiguration {
    pub id: i64,
    pub min_value: f64,
    pub max_value: f64,
    pub min_value_description: Option<String>,
    pub max_value_description: Option<String>,
}

/// Stored text configuration row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextConfiguration {
    pub id: i64,
    pub value_description: Option<String>,
}

/// A stored result configuration row of any variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultConfiguration {
    Boolean(BooleanConfiguration),
    Number(NumericalConfiguration),
    Text(TextConfiguration),
}

impl ResultConfiguration {
    #[must_use]
    pub fn id(&self) -> i64 {
        match self {
            Self::Boolean(c) => c.id,
            Self::Number(c) => c.id,
            Self::Text(c) => c.id,
        }
    }

    #[must_use]
    pub fn result_type(&self) -> ResultType {
        match self {
            Self::Boolean(_) => ResultType::Boolean,
            Self::Number(_) => ResultType::Number,
            Self::Text(_) => ResultType::Text,
        }
    }
}
