use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::message::Message;
use crate::models::tool::Tool;
use crate::providers::base::{Provider, Usage};

/// Scripted provider for tests. Each call pops the next pre-baked response;
/// once the script runs dry it answers with a blank assistant message, so a
/// driver under test winds down instead of panicking.
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<Message>>>,
    usage: Usage,
}

impl MockProvider {
    pub fn new(responses: Vec<Message>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            usage: Usage::default(),
        }
    }

    /// Report the given usage on every completion instead of the default
    /// empty counts.
    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(
        &self,
        _system: &str,
        _messages: &[Message],
        _tools: &[Tool],
    ) -> Result<(Message, Usage)> {
        let response = self
            .responses
            .lock()
            .map_err(|_| anyhow!("mock response script lock poisoned"))?
            .pop_front()
            .unwrap_or_else(|| Message::assistant().with_text(""));
        Ok((response, self.usage.clone()))
    }
}
