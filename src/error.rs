//! Error types for mysql-orm
//!
//! This module defines the error taxonomy used throughout the crate.

use sqlx::error::ErrorKind;
use thiserror::Error;

/// Result type alias for mysql-orm
pub type Result<T> = std::result::Result<T, OrmError>;

/// Main error type for mysql-orm
#[derive(Error, Debug)]
pub enum OrmError {
    /// Engine errors passed through verbatim, including constraint violations
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Connection failures, surfaced after the one-shot create-database recovery
    #[error("Connection error ({context}): {source}")]
    Connection {
        context: String,
        #[source]
        source: sqlx::Error,
    },

    /// Declaration-time configuration errors (missing config, empty model, bad reference)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Raised only by `get` when zero rows match
    #[error("Not found: {0}")]
    NotFound(String),

    /// IO-related errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file parse errors
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl OrmError {
    /// Whether this error is a constraint violation reported by the engine
    /// (NOT NULL, UNIQUE, FOREIGN KEY, CHECK).
    ///
    /// Violations are never translated into a dedicated variant; callers that
    /// need to branch (e.g. to roll back a transaction) test the underlying
    /// database error kind through this helper.
    pub fn is_constraint_violation(&self) -> bool {
        let source = match self {
            OrmError::Database(e) | OrmError::Connection { source: e, .. } => e,
            _ => return false,
        };
        source
            .as_database_error()
            .map(|db| {
                matches!(
                    db.kind(),
                    ErrorKind::UniqueViolation
                        | ErrorKind::ForeignKeyViolation
                        | ErrorKind::NotNullViolation
                        | ErrorKind::CheckViolation
                )
            })
            .unwrap_or(false)
    }

    /// Whether this error is the single-row fetch miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, OrmError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        let err = OrmError::NotFound("users".to_string());
        assert!(err.is_not_found());
        assert!(!err.is_constraint_violation());
    }

    #[test]
    fn test_config_error_display() {
        let err = OrmError::Config("model declares no fields".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: model declares no fields"
        );
    }

    #[test]
    fn test_non_database_errors_are_not_violations() {
        let err = OrmError::Config("missing host".to_string());
        assert!(!err.is_constraint_violation());

        let err = OrmError::Database(sqlx::Error::RowNotFound);
        assert!(!err.is_constraint_violation());
    }
}
