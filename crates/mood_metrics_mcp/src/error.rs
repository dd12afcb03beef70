//! Errors surfaced by the MCP server.

use mood_metrics::{MoodError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum McpError {
    #[error("Store error: {0}")]
    Store(#[from] MoodError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl McpError {
    /// Store errors that wrap a validation failure are reported as validation.
    pub fn flatten(self) -> Self {
        match self {
            McpError::Store(MoodError::Validation(v)) => McpError::Validation(v),
            other => other,
        }
    }
}

impl From<McpError> for String {
    fn from(err: McpError) -> Self {
        err.flatten().to_string()
    }
}

pub type McpResult<T> = Result<T, McpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_validation_is_reported_as_validation() {
        let err: McpError = MoodError::Validation(ValidationError::MissingUserId).into();
        let msg: String = err.into();
        assert_eq!(msg, "Validation error: user id is required");
    }

    #[test]
    fn not_found_keeps_store_prefix() {
        let msg: String = McpError::from(MoodError::NotFound("mood record x".into())).into();
        assert!(msg.starts_with("Store error: not found"));
    }

    #[test]
    fn invalid_argument_is_reported_verbatim() {
        let msg: String = McpError::InvalidArgument("nothing to update".into()).into();
        assert_eq!(msg, "Invalid argument: nothing to update");
    }
}
