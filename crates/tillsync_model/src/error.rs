//! Error types for the data model.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while converting or validating model values.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A table name that is not one of the synchronized tables.
    #[error("unknown table: {0}")]
    UnknownTable(String),

    /// A record could not be converted to or from a typed entity.
    #[error("record conversion failed: {0}")]
    Conversion(#[from] serde_json::Error),

    /// A serialized entity was not a JSON object.
    #[error("entity did not serialize to an object")]
    NotAnObject,

    /// An entity failed its schema check.
    #[error("invalid {table} record: {reason}")]
    Invalid {
        /// Table the entity belongs to.
        table: &'static str,
        /// What was wrong.
        reason: String,
    },

    /// No code above the highest existing one can be represented.
    #[error("sequence {prefix} is exhausted")]
    SequenceExhausted {
        /// Code prefix.
        prefix: String,
    },
}

impl ModelError {
    /// Creates a validation error for the given table.
    pub fn invalid(table: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            table,
            reason: reason.into(),
        }
    }
}
