use serde::{Deserialize, Serialize};
use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum AgentError {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Tool execution failed: {0}")]
    ExecutionError(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Tool '{tool}' is provided by both the '{first}' and '{second}' backends")]
    ToolNameCollision {
        tool: String,
        first: String,
        second: String,
    },

    #[error("Exceeded {0} tool rounds in a single turn")]
    ToolRoundLimit(usize),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AgentResult<T> = Result<T, AgentError>;
