//! Structured errors for the stashd server.
//!
//! Failures that happen in the tool layer itself, before or after the
//! worker runs. Worker failures arrive as [`stashd_core::Error`].

use rmcp::model::{ErrorCode, ErrorData as McpError};

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Tool arguments failed validation.
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// A handler answered with an outcome for a different event.
    #[error("UNEXPECTED_OUTCOME: {0}")]
    UnexpectedOutcome(String),

    #[error("SERIALIZE_FAILED: {0}")]
    Serialize(String),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let (code, message) = match &err {
            ToolError::InvalidInput(msg) => (-32602, msg.clone()),
            ToolError::UnexpectedOutcome(msg) => (-32603, msg.clone()),
            ToolError::Serialize(msg) => (-32603, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
