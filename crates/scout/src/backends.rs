use std::collections::HashMap;

use async_trait::async_trait;

use crate::errors::{AgentError, AgentResult};
use crate::models::content::Content;
use crate::models::tool::{Tool, ToolCall};

pub mod operations;
pub mod prompt;
pub mod resource;
pub mod web;

pub use prompt::{PromptArgument, PromptError, PromptTemplate};
pub use resource::ResourceInfo;

/// A backend service the agent can drive: a set of named, schema-described
/// tools, plus optional fetchable resources and parameterized prompt
/// templates. Tool names must be unique across every backend connected to
/// one agent; the agent enforces that at startup.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Get the name of the backend
    fn name(&self) -> &str;

    /// Get the backend description
    fn description(&self) -> &str;

    /// Instructions for the model on how to use this backend
    fn instructions(&self) -> &str;

    /// Get available tools
    fn tools(&self) -> &[Tool];

    /// Get available prompt templates
    fn prompts(&self) -> &[PromptTemplate] {
        &[]
    }

    /// Get available resources
    fn resources(&self) -> &[ResourceInfo] {
        &[]
    }

    /// Call a tool with the given parameters
    async fn call(&self, tool_call: ToolCall) -> AgentResult<Vec<Content>>;

    /// Fetch the current content of a resource by URI. Backends that do not
    /// serve the URI return `ResourceNotFound` so the caller can try the
    /// next one.
    async fn read_resource(&self, uri: &str) -> AgentResult<String> {
        Err(AgentError::ResourceNotFound(uri.to_string()))
    }

    /// Resolve a named prompt template into one or more message bodies.
    /// Required arguments that are absent from the mapping produce
    /// `PromptError::MissingParameters`, the recoverable signal the session
    /// uses to ask the user for them.
    async fn render_prompt(
        &self,
        name: &str,
        _arguments: &HashMap<String, String>,
    ) -> Result<Vec<String>, PromptError> {
        Err(PromptError::NotFound(name.to_string()))
    }
}
