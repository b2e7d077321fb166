//! Schema errors.
//!
//! Every variant is a schema-authoring or programming error. None of them
//! is meant to be shown to an end user as a form message.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading a schema document or resolving its types.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Type already registered: {0}")]
    DuplicateType(String),

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("View '{view}' references unknown field '{field}'")]
    UnknownViewField { view: String, field: String },

    #[error("Malformed field {model}.{field}: {reason}")]
    MalformedField {
        model: String,
        field: String,
        reason: String,
    },

    #[error("Malformed enum {name}: {reason}")]
    MalformedEnum { name: String, reason: String },

    #[error("Failed to parse schema: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read schema {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
