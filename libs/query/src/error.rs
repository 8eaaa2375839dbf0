//! Error types for the dynamic query engine

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid value '{value}' for attribute {attribute}: {reason}")]
    Parse {
        attribute: String,
        value: String,
        reason: String,
    },

    #[error("Invalid {param} value: {value}")]
    InvalidPageParameter { param: &'static str, value: String },

    #[error("Parameter '{0}' must not appear more than once")]
    DuplicateParameter(String),

    #[error("Entity type not registered: {0}")]
    UnknownEntity(String),

    #[error("No primary key declared for entity type {0}")]
    MissingPrimaryKey(String),

    #[error("Invalid entity metadata: {0}")]
    InvalidMetadata(String),

    #[error("Invalid query shape: {0}")]
    InvalidShape(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Query execution failed: {0}")]
    Execution(String),
}

impl Error {
    /// True for failures caused by the request itself rather than by
    /// configuration or the execution engine.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Parse { .. }
                | Error::InvalidPageParameter { .. }
                | Error::DuplicateParameter(_)
                | Error::Validation(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
