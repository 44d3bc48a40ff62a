//! Error types for the custom fields store

use thiserror::Error;

/// Result type for custom field operations
pub type Result<T> = std::result::Result<T, FieldsError>;

/// Errors that can occur in custom field operations
#[derive(Debug, Error)]
pub enum FieldsError {
    /// No field definition with this id
    #[error("field not found: {id}")]
    FieldNotFound { id: i64 },

    /// Type id is not in the field type registry
    #[error("unknown field type: {id}")]
    UnknownFieldType { id: i64 },

    /// Group and field repetition indexes start at 1
    #[error("invalid {kind} index {index}: indexes start at 1")]
    InvalidIndex { kind: &'static str, index: i64 },

    /// No panel with this id
    #[error("panel not found: {id}")]
    PanelNotFound { id: i64 },

    /// Table prefix would not be a safe SQL identifier
    #[error("invalid table prefix '{prefix}': only letters, digits and '_' are allowed")]
    InvalidTablePrefix { prefix: String },

    /// SQLite error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON encoding of properties or list values failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for FieldsError {
    fn from(error: figment::Error) -> Self {
        FieldsError::Config(Box::new(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FieldsError::FieldNotFound { id: 42 };
        assert_eq!(err.to_string(), "field not found: 42");
    }

    #[test]
    fn test_invalid_index_display() {
        let err = FieldsError::InvalidIndex {
            kind: "group",
            index: 0,
        };
        assert!(err.to_string().contains("group index 0"));
    }

    #[test]
    fn test_database_error_converts() {
        let err: FieldsError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, FieldsError::Database(_)));
    }
}
