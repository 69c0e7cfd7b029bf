//! Mapper error types

use thiserror::Error;

use crate::operation::OperationError;

/// Errors that can occur while building templates or transforming data
#[derive(Debug, Error)]
pub enum MapperError {
    #[error("Template not provided")]
    TemplateMissingOrInvalid,

    #[error("Data not provided")]
    DataMissingOrInvalid,

    #[error("Invalid mapping for field '{field}': expected a path string or an object, found {found}")]
    InvalidMapping { field: String, found: &'static str },

    #[error("Invalid operation entry: {0}")]
    InvalidOperation(String),

    #[error("Operation not found: {name}")]
    UnknownOperation { name: String },

    #[error("Operation on '{key}' failed: {source}")]
    Operation {
        key: String,
        #[source]
        source: OperationError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MapperError {
    /// Check if this is one of the two precondition failures of `transform`
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            MapperError::TemplateMissingOrInvalid | MapperError::DataMissingOrInvalid
        )
    }
}

/// Name of a JSON value's type, for error messages
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
