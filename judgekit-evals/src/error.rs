//! Error types for evaluation operations.

use thiserror::Error;

/// Result type for evaluation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while creating or reading evaluations.
///
/// `BadRequest` and `NotFound` are expected outcomes that callers report
/// back to the user. Everything else is an infrastructure failure.
#[derive(Debug, Error)]
pub enum Error {
    /// The request is malformed or violates a business rule.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Database error from libSQL.
    #[error("database error: {0}")]
    Database(#[from] libsql::Error),

    /// JSON serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid data in the database.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// A schema migration failed.
    #[error("migration failed: {0}")]
    Migration(String),

    /// Filesystem error while preparing the database.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error is a user-facing outcome rather than a failure.
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(self, Self::BadRequest(_) | Self::NotFound(_))
    }

    /// Short machine-readable kind, used in logs and CLI output.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Database(_) => "database",
            Self::Serialization(_) => "serialization",
            Self::InvalidData(_) => "invalid_data",
            Self::Migration(_) => "migration",
            Self::Io(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_request_and_not_found_are_expected() {
        assert!(Error::BadRequest("x".into()).is_expected());
        assert!(Error::NotFound("x".into()).is_expected());
        assert!(!Error::InvalidData("x".into()).is_expected());
        assert!(!Error::Migration("x".into()).is_expected());
    }

    #[test]
    fn display_includes_message() {
        let err = Error::NotFound("Evaluation template not found".into());
        assert_eq!(err.to_string(), "not found: Evaluation template not found");
        assert_eq!(err.kind(), "not_found");
    }
}
