//! libSQL-backed storage for evaluations and their tenancy context.
//!
//! [`Database`] owns the connection and hands out [`UnitOfWork`]s. Every
//! write goes through a unit of work; the per-entity modules below take
//! either a plain `&Connection` (reads and single-row writes) or the unit of
//! work itself when they also need to buffer events.

pub mod documents;
pub mod evaluations;
pub mod migrations;
pub mod providers;
pub mod templates;
mod turso;
pub mod users;
pub mod workspaces;

pub use turso::{Database, UnitOfWork};

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};

/// Format a datetime for storage.
pub(crate) fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Parse a datetime from storage.
pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| Error::InvalidData(format!("invalid datetime: {}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datetime_round_trips_through_storage_format() {
        let now = Utc::now();
        assert_eq!(parse_datetime(&format_datetime(now)).unwrap(), now);
    }

    #[test]
    fn malformed_datetime_is_invalid_data() {
        let err = parse_datetime("yesterday").unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }
}
