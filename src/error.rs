use thiserror::Error;

use crate::field_value::Target;

/// Failures of a single parse call. Every variant aborts the whole call.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid JSON document: {0}")]
    InvalidDocument(#[source] serde_json::Error),

    #[error("query `{query}` for field `{field}` did not resolve to a value")]
    QueryNotFound { field: String, query: String },

    #[error("cannot convert {found} from query `{query}` to {target} for field `{field}`")]
    UnsupportedCoercion {
        field: String,
        query: String,
        target: Target,
        found: String,
    },

    #[error("no record spec configured")]
    NoRecordSpec,
}

impl ExtractError {
    pub fn is_invalid_document(&self) -> bool {
        matches!(self, ExtractError::InvalidDocument(_))
    }

    /// Destination field the error refers to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            ExtractError::QueryNotFound { field, .. }
            | ExtractError::UnsupportedCoercion { field, .. } => Some(field),
            ExtractError::InvalidDocument(_) | ExtractError::NoRecordSpec => None,
        }
    }
}
