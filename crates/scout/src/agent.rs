use std::collections::HashMap;

use anyhow::Result;
use futures::stream::BoxStream;
use serde::Serialize;
use tracing::{debug, warn};

use crate::backends::{Backend, PromptError, PromptTemplate, ResourceInfo};
use crate::errors::{AgentError, AgentResult};
use crate::models::content::Content;
use crate::models::message::{Message, ToolRequest};
use crate::models::tool::{Tool, ToolCall};
use crate::prompt_template::render_template_file;
use crate::providers::base::Provider;

/// Upper bound on tool rounds within one user turn. A model that keeps
/// requesting tools past this point ends the turn with a recoverable error
/// instead of hanging the session.
pub const MAX_TOOL_ROUNDS: usize = 16;

#[derive(Clone, Debug, Serialize)]
struct BackendInfo {
    name: String,
    description: String,
    instructions: String,
}

/// Agent integrates a foundational LLM with the tool backends it can drive.
///
/// Each call to [`Agent::reply`] runs one user turn: alternate between asking
/// the model and executing the tools it requested, until the model answers
/// with no further tool requests.
pub struct Agent {
    provider: Box<dyn Provider + Send + Sync>,
    backends: Vec<Box<dyn Backend>>,
}

impl Agent {
    /// Create a new Agent with the specified provider
    pub fn new(provider: Box<dyn Provider + Send + Sync>) -> Self {
        Self {
            provider,
            backends: Vec::new(),
        }
    }

    /// Add a backend to the agent. Tool names are exposed to the model
    /// unprefixed, so a name collision across backends is a configuration
    /// fault and fails here rather than letting one backend shadow the
    /// other.
    pub fn add_backend(&mut self, backend: Box<dyn Backend>) -> AgentResult<()> {
        for tool in backend.tools() {
            if let Some(owner) = self.backend_for_tool(&tool.name) {
                return Err(AgentError::ToolNameCollision {
                    tool: tool.name.clone(),
                    first: owner.name().to_string(),
                    second: backend.name().to_string(),
                });
            }
        }
        self.backends.push(backend);
        Ok(())
    }

    /// The merged tool set across all backends
    pub fn tools(&self) -> Vec<Tool> {
        self.backends
            .iter()
            .flat_map(|backend| backend.tools().iter().cloned())
            .collect()
    }

    /// The merged prompt templates across all backends
    pub fn prompt_templates(&self) -> Vec<PromptTemplate> {
        self.backends
            .iter()
            .flat_map(|backend| backend.prompts().iter().cloned())
            .collect()
    }

    /// The merged resource listings across all backends
    pub fn resource_infos(&self) -> Vec<ResourceInfo> {
        self.backends
            .iter()
            .flat_map(|backend| backend.resources().iter().cloned())
            .collect()
    }

    fn backend_for_tool(&self, name: &str) -> Option<&dyn Backend> {
        self.backends
            .iter()
            .find(|backend| backend.tools().iter().any(|tool| tool.name == name))
            .map(|backend| &**backend)
    }

    /// Fetch a resource by URI; the first backend that serves it wins.
    pub async fn read_resource(&self, uri: &str) -> AgentResult<String> {
        for backend in &self.backends {
            match backend.read_resource(uri).await {
                Ok(content) => return Ok(content),
                Err(AgentError::ResourceNotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(AgentError::ResourceNotFound(uri.to_string()))
    }

    /// Resolve a named prompt template against the backend that owns it.
    pub async fn render_prompt(
        &self,
        name: &str,
        arguments: &HashMap<String, String>,
    ) -> Result<Vec<String>, PromptError> {
        for backend in &self.backends {
            if backend.prompts().iter().any(|prompt| prompt.name == name) {
                return backend.render_prompt(name, arguments).await;
            }
        }
        Err(PromptError::NotFound(name.to_string()))
    }

    /// Dispatch a single tool call to the backend providing the tool
    async fn dispatch_tool_call(
        &self,
        tool_call: AgentResult<ToolCall>,
    ) -> AgentResult<Vec<Content>> {
        let call = tool_call?;
        let backend = self
            .backend_for_tool(&call.name)
            .ok_or_else(|| AgentError::ToolNotFound(call.name.clone()))?;
        debug!(tool = %call.name, backend = backend.name(), "dispatching tool call");
        backend.call(call).await
    }

    fn get_system_prompt(&self) -> AgentResult<String> {
        let backends: Vec<BackendInfo> = self
            .backends
            .iter()
            .map(|backend| BackendInfo {
                name: backend.name().to_string(),
                description: backend.description().to_string(),
                instructions: backend.instructions().to_string(),
            })
            .collect();

        let mut context = HashMap::new();
        context.insert("backends", backends);
        render_template_file("system.md", &context).map_err(|e| AgentError::Internal(e.to_string()))
    }

    /// Create a stream that yields each message as it is generated for this
    /// turn: the assistant's responses and the tool-result messages.
    ///
    /// Tool requests within one round run concurrently, but their results
    /// are recorded in request order. A tool failure becomes an error-valued
    /// tool result the model sees on its next call; only the round cap and a
    /// failed model call end the stream with an error.
    pub async fn reply(&self, messages: &[Message]) -> Result<BoxStream<'_, Result<Message>>> {
        let mut messages = messages.to_vec();
        let tools = self.tools();
        let system_prompt = self.get_system_prompt()?;

        Ok(Box::pin(async_stream::try_stream! {
            let mut rounds = 0;
            loop {
                let (response, _usage) = self.provider.complete(
                    &system_prompt,
                    &messages,
                    &tools,
                ).await?;

                yield response.clone();

                // ensure the message above is delivered before potentially
                // long-running tool calls start
                tokio::task::yield_now().await;

                let tool_requests: Vec<&ToolRequest> = response.content
                    .iter()
                    .filter_map(|content| content.as_tool_request())
                    .collect();

                if tool_requests.is_empty() {
                    // no more tool calls, the turn is settled
                    break;
                }

                rounds += 1;
                if rounds > MAX_TOOL_ROUNDS {
                    warn!(rounds, "aborting runaway tool-calling loop");
                    Err(AgentError::ToolRoundLimit(MAX_TOOL_ROUNDS))?;
                }

                let futures: Vec<_> = tool_requests
                    .iter()
                    .map(|request| self.dispatch_tool_call(request.tool_call.clone()))
                    .collect();

                // run concurrently; join_all keeps output order aligned with
                // request order
                let outputs = futures::future::join_all(futures).await;

                let mut message_tool_response = Message::user();
                for (request, output) in tool_requests.iter().zip(outputs.into_iter()) {
                    message_tool_response = message_tool_response.with_tool_response(
                        request.id.clone(),
                        output,
                    );
                }

                yield message_tool_response.clone();

                messages.push(response.clone());
                messages.push(message_tool_response);
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::MessageContent;
    use crate::providers::base::Usage;
    use crate::providers::mock::MockProvider;
    use async_trait::async_trait;
    use futures::TryStreamExt;
    use serde_json::json;
    use std::time::Duration;

    // Mock backend whose echo tool can delay, to exercise result ordering
    struct MockBackend {
        name: String,
        tools: Vec<Tool>,
    }

    impl MockBackend {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                tools: vec![Tool::new(
                    format!("{}_echo", name),
                    "Echoes back the input",
                    json!({
                        "type": "object",
                        "required": ["message"],
                        "properties": {
                            "message": {"type": "string"},
                            "delay_ms": {"type": "integer"}
                        }
                    }),
                )],
            }
        }
    }

    #[async_trait]
    impl Backend for MockBackend {
        fn name(&self) -> &str {
            &self.name
        }

        fn description(&self) -> &str {
            "A mock backend for testing"
        }

        fn instructions(&self) -> &str {
            "Mock backend instructions"
        }

        fn tools(&self) -> &[Tool] {
            &self.tools
        }

        async fn call(&self, tool_call: ToolCall) -> AgentResult<Vec<Content>> {
            if tool_call.name != format!("{}_echo", self.name) {
                return Err(AgentError::ToolNotFound(tool_call.name));
            }
            if let Some(delay) = tool_call.arguments.get("delay_ms").and_then(|v| v.as_u64()) {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            Ok(vec![Content::text(
                tool_call.arguments["message"].as_str().unwrap_or(""),
            )])
        }
    }

    // Provider that requests the same tool forever, to exercise the round cap
    struct LoopingProvider;

    #[async_trait]
    impl Provider for LoopingProvider {
        async fn complete(
            &self,
            _system: &str,
            _messages: &[Message],
            _tools: &[Tool],
        ) -> Result<(Message, Usage)> {
            Ok((
                Message::assistant().with_tool_request(
                    "loop",
                    Ok(ToolCall::new("test_echo", json!({"message": "again"}))),
                ),
                Usage::default(),
            ))
        }
    }

    async fn collect(agent: &Agent, text: &str) -> Result<Vec<Message>> {
        let initial = vec![Message::user().with_text(text)];
        let mut stream = agent.reply(&initial).await?;
        let mut messages = Vec::new();
        while let Some(message) = stream.try_next().await? {
            messages.push(message);
        }
        Ok(messages)
    }

    #[tokio::test]
    async fn test_simple_response() -> Result<()> {
        let response = Message::assistant().with_text("Hello!");
        let provider = MockProvider::new(vec![response.clone()]);
        let agent = Agent::new(Box::new(provider));

        let messages = collect(&agent, "Hi").await?;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0], response);
        Ok(())
    }

    #[tokio::test]
    async fn test_tool_call() -> Result<()> {
        let mut agent = Agent::new(Box::new(MockProvider::new(vec![
            Message::assistant().with_tool_request(
                "1",
                Ok(ToolCall::new("test_echo", json!({"message": "test"}))),
            ),
            Message::assistant().with_text("Done!"),
        ])));
        agent.add_backend(Box::new(MockBackend::new("test")))?;

        let messages = collect(&agent, "Echo test").await?;

        // tool request, tool result, final answer — in that order
        assert_eq!(messages.len(), 3);
        assert!(messages[0]
            .content
            .iter()
            .any(|c| matches!(c, MessageContent::ToolRequest(_))));
        assert!(messages[1]
            .content
            .iter()
            .any(|c| matches!(c, MessageContent::ToolResponse(_))));
        assert_eq!(messages[2].content[0], MessageContent::text("Done!"));
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_tool() -> Result<()> {
        let mut agent = Agent::new(Box::new(MockProvider::new(vec![
            Message::assistant()
                .with_tool_request("1", Ok(ToolCall::new("invalid_tool", json!({})))),
            Message::assistant().with_text("Error occurred"),
        ])));
        agent.add_backend(Box::new(MockBackend::new("test")))?;

        let messages = collect(&agent, "Invalid tool").await?;

        // the failure becomes a tool result, the loop keeps going
        assert_eq!(messages.len(), 3);
        let response = messages[1].content[0].as_tool_response().unwrap();
        assert!(matches!(
            response.tool_result,
            Err(AgentError::ToolNotFound(_))
        ));
        assert_eq!(
            messages[2].content[0],
            MessageContent::text("Error occurred")
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_tool_results_keep_request_order() -> Result<()> {
        // the first request sleeps, so it finishes last
        let mut agent = Agent::new(Box::new(MockProvider::new(vec![
            Message::assistant()
                .with_tool_request(
                    "1",
                    Ok(ToolCall::new(
                        "test_echo",
                        json!({"message": "first", "delay_ms": 50}),
                    )),
                )
                .with_tool_request(
                    "2",
                    Ok(ToolCall::new("test_echo", json!({"message": "second"}))),
                ),
            Message::assistant().with_text("All done!"),
        ])));
        agent.add_backend(Box::new(MockBackend::new("test")))?;

        let messages = collect(&agent, "Multiple calls").await?;

        assert_eq!(messages.len(), 3);
        let responses: Vec<_> = messages[1]
            .content
            .iter()
            .filter_map(|c| c.as_tool_response())
            .collect();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].id, "1");
        assert_eq!(
            responses[0].tool_result.as_ref().unwrap()[0].as_text(),
            Some("first")
        );
        assert_eq!(responses[1].id, "2");
        Ok(())
    }

    #[tokio::test]
    async fn test_round_cap_surfaces_as_error() -> Result<()> {
        let mut agent = Agent::new(Box::new(LoopingProvider));
        agent.add_backend(Box::new(MockBackend::new("test")))?;

        let initial = vec![Message::user().with_text("go")];
        let mut stream = agent.reply(&initial).await?;

        let mut yielded = 0;
        let error = loop {
            match stream.try_next().await {
                Ok(Some(_)) => yielded += 1,
                Ok(None) => panic!("stream ended without hitting the cap"),
                Err(e) => break e,
            }
        };
        assert!(error.to_string().contains("tool rounds"));
        // one assistant and one tool-result message per allowed round, plus
        // the assistant message of the aborted round
        assert_eq!(yielded, MAX_TOOL_ROUNDS * 2 + 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_tool_name_collision_rejected() {
        let mut agent = Agent::new(Box::new(MockProvider::new(vec![])));
        agent
            .add_backend(Box::new(MockBackend::new("test")))
            .unwrap();

        let result = agent.add_backend(Box::new(MockBackend::new("test")));
        assert!(matches!(
            result,
            Err(AgentError::ToolNameCollision { .. })
        ));
        // the merged tool set is unchanged
        assert_eq!(agent.tools().len(), 1);
    }

    #[tokio::test]
    async fn test_read_resource_falls_through_backends() {
        struct ResourceBackend;

        #[async_trait]
        impl Backend for ResourceBackend {
            fn name(&self) -> &str {
                "res"
            }
            fn description(&self) -> &str {
                "serves one resource"
            }
            fn instructions(&self) -> &str {
                ""
            }
            fn tools(&self) -> &[Tool] {
                &[]
            }
            async fn call(&self, tool_call: ToolCall) -> AgentResult<Vec<Content>> {
                Err(AgentError::ToolNotFound(tool_call.name))
            }
            async fn read_resource(&self, uri: &str) -> AgentResult<String> {
                if uri == "res://only" {
                    Ok("content".to_string())
                } else {
                    Err(AgentError::ResourceNotFound(uri.to_string()))
                }
            }
        }

        let mut agent = Agent::new(Box::new(MockProvider::new(vec![])));
        agent
            .add_backend(Box::new(MockBackend::new("test")))
            .unwrap();
        agent.add_backend(Box::new(ResourceBackend)).unwrap();

        assert_eq!(
            agent.read_resource("res://only").await.unwrap(),
            "content"
        );
        assert!(matches!(
            agent.read_resource("res://other").await,
            Err(AgentError::ResourceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_render_prompt_unknown_name() {
        let agent = Agent::new(Box::new(MockProvider::new(vec![])));
        let result = agent.render_prompt("nope", &HashMap::new()).await;
        assert_eq!(result, Err(PromptError::NotFound("nope".to_string())));
    }
}
