//! Form state errors.

use simform_schema::SchemaError;
use thiserror::Error;

/// Errors raised by the stores and the reconciler.
///
/// Apart from `CommitRejected`, every variant means the caller is out of
/// sync with the schema: a defect, not a message for the user.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("Form not initialized: {0}")]
    FormNotInitialized(String),

    #[error("Unknown field: {model}.{field}")]
    UnknownField { model: String, field: String },

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Unknown view: {0}")]
    UnknownView(String),

    #[error("Commit rejected for {model}: invalid fields [{}]", .invalid_fields.join(", "))]
    CommitRejected {
        model: String,
        invalid_fields: Vec<String>,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
