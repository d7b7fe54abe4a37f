use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use super::Backend;
use crate::errors::{AgentError, AgentResult};
use crate::models::content::Content;
use crate::models::tool::{Tool, ToolCall};

// pages are truncated so a single fetch cannot flood the conversation
const MAX_PAGE_CHARS: usize = 20_000;

/// Web backend: fetches pages for the model, returning tag-stripped text.
pub struct WebBackend {
    client: reqwest::Client,
    tools: Vec<Tool>,
}

impl WebBackend {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        let fetch_tool = Tool::new(
            "fetch_page",
            "Fetch a web page and return its visible text, truncated to a \
             manageable length.",
            json!({
                "type": "object",
                "required": ["url"],
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "The http(s) URL to fetch."
                    }
                }
            }),
        );

        Ok(Self {
            client,
            tools: vec![fetch_tool],
        })
    }

    async fn fetch_page(&self, args: &Value) -> AgentResult<Vec<Content>> {
        let url = args
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| AgentError::InvalidParameters("'url' must be a string".to_string()))?;
        let url = Url::parse(url)
            .map_err(|e| AgentError::InvalidParameters(format!("Invalid URL '{}': {}", url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AgentError::InvalidParameters(format!(
                "Unsupported URL scheme '{}'",
                url.scheme()
            )));
        }

        debug!(url = %url, "fetching page");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| AgentError::ExecutionError(format!("Request failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(AgentError::ExecutionError(format!(
                "Request to {} failed with status {}",
                url,
                response.status()
            )));
        }
        let body = response
            .text()
            .await
            .map_err(|e| AgentError::ExecutionError(format!("Failed to read body: {}", e)))?;

        Ok(vec![Content::text(strip_tags(&body))])
    }
}

/// Crude visible-text extraction: drop script/style blocks, then all tags,
/// then collapse whitespace.
fn strip_tags(html: &str) -> String {
    let blocks = Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>").unwrap();
    let tags = Regex::new(r"(?s)<[^>]*>").unwrap();

    let without_blocks = blocks.replace_all(html, " ");
    let without_tags = tags.replace_all(&without_blocks, " ");
    let text = without_tags
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if text.chars().count() > MAX_PAGE_CHARS {
        text.chars().take(MAX_PAGE_CHARS).collect()
    } else {
        text
    }
}

#[async_trait]
impl Backend for WebBackend {
    fn name(&self) -> &str {
        "web"
    }

    fn description(&self) -> &str {
        "Fetches web pages as plain text"
    }

    fn instructions(&self) -> &str {
        "Use fetch_page to read a specific URL when the answer depends on \
         current web content."
    }

    fn tools(&self) -> &[Tool] {
        &self.tools
    }

    async fn call(&self, tool_call: ToolCall) -> AgentResult<Vec<Content>> {
        match tool_call.name.as_str() {
            "fetch_page" => self.fetch_page(&tool_call.arguments).await,
            _ => Err(AgentError::ToolNotFound(tool_call.name)),
        }
    }
}
