use std::collections::{HashMap, HashSet};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;
use indoc::indoc;
use serde_json::{json, Value};
use tracing::debug;

use super::{Backend, PromptArgument, PromptError, PromptTemplate, ResourceInfo};
use crate::errors::{AgentError, AgentResult};
use crate::models::content::Content;
use crate::models::tool::{Tool, ToolCall};
use crate::prompt_template::render_template;

pub const STORE_LIST_URI: &str = "store://list";
const DEFAULT_STORE: &str = "default";
const INDEX_FILE: &str = "docs.jsonl";
const SEARCH_LIMIT: usize = 5;

const RESEARCH_PROMPT: &str = indoc! {r#"
    You are an AI researcher. Conduct a deep investigation into the topic: **{{ topic }}**.

    Provide:
    1. Definition and scope
    2. Current state of research
    3. Relevant papers and datasets
    4. Potential future directions

    Use advanced terminology and ensure scientific rigor.
"#};

/// Research operations backend: a document store rooted at a data directory,
/// with save and search tools, a store listing resource, and the deep
/// research prompt template.
///
/// Search ranks by term overlap with the query. The storage format is one
/// JSON string per line under `<root>/<store>/docs.jsonl`.
pub struct OperationsBackend {
    root: PathBuf,
    tools: Vec<Tool>,
    prompts: Vec<PromptTemplate>,
    resources: Vec<ResourceInfo>,
}

impl OperationsBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let save_tool = Tool::new(
            "save_documents",
            "Save documents to a named document store so they can be searched later. \
             Creates the store if it does not exist yet.",
            json!({
                "type": "object",
                "required": ["docs"],
                "properties": {
                    "docs": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "The documents to save, one string each."
                    },
                    "store": {
                        "type": "string",
                        "default": DEFAULT_STORE,
                        "description": "The store to save into. Defaults to 'default'."
                    }
                }
            }),
        );

        let search_tool = Tool::new(
            "search_documents",
            "Search a named document store and return the most relevant documents.",
            json!({
                "type": "object",
                "required": ["query"],
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query."
                    },
                    "store": {
                        "type": "string",
                        "default": DEFAULT_STORE,
                        "description": "The store to search. Defaults to 'default'."
                    }
                }
            }),
        );

        let prompts_tool = Tool::new(
            "available_prompts",
            "List the prompt templates this backend offers. Give the EXACT name of \
             a prompt when the user asks what prompts are available.",
            json!({
                "type": "object",
                "properties": {}
            }),
        );

        let research_prompt = PromptTemplate::new(
            "research_prompt",
            "Structured deep research instructions on a given topic",
            vec![PromptArgument::required("topic", "The topic to research")],
        );

        let store_list = ResourceInfo {
            uri: STORE_LIST_URI.to_string(),
            name: "stores".to_string(),
            description: Some("Newline separated list of available document stores".to_string()),
        };

        Self {
            root: root.into(),
            tools: vec![save_tool, search_tool, prompts_tool],
            prompts: vec![research_prompt],
            resources: vec![store_list],
        }
    }

    fn store_dir(&self, args: &Value) -> AgentResult<(String, PathBuf)> {
        let store = args
            .get("store")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_STORE);
        if store.is_empty() || store.contains(['/', '\\']) || store == ".." {
            return Err(AgentError::InvalidParameters(format!(
                "'{}' is not a valid store name",
                store
            )));
        }
        Ok((store.to_string(), self.root.join(store)))
    }

    fn save_documents(&self, args: &Value) -> AgentResult<Vec<Content>> {
        let docs = args
            .get("docs")
            .and_then(Value::as_array)
            .ok_or_else(|| AgentError::InvalidParameters("'docs' must be an array".to_string()))?;
        let docs: Vec<&str> = docs
            .iter()
            .map(|doc| {
                doc.as_str().ok_or_else(|| {
                    AgentError::InvalidParameters("'docs' entries must be strings".to_string())
                })
            })
            .collect::<AgentResult<_>>()?;

        let (store, dir) = self.store_dir(args)?;
        fs::create_dir_all(&dir)
            .map_err(|e| AgentError::ExecutionError(format!("Failed to create store: {}", e)))?;

        let mut index = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(INDEX_FILE))
            .map_err(|e| AgentError::ExecutionError(format!("Failed to open index: {}", e)))?;
        for doc in &docs {
            let line = serde_json::to_string(doc)
                .map_err(|e| AgentError::Internal(e.to_string()))?;
            writeln!(index, "{}", line)
                .map_err(|e| AgentError::ExecutionError(format!("Failed to write index: {}", e)))?;
        }

        debug!(store = %store, count = docs.len(), "saved documents");
        Ok(vec![Content::text(format!(
            "Saved {} documents to store '{}'",
            docs.len(),
            store
        ))])
    }

    fn search_documents(&self, args: &Value) -> AgentResult<Vec<Content>> {
        let query = args
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| AgentError::InvalidParameters("'query' must be a string".to_string()))?;

        let (store, dir) = self.store_dir(args)?;
        let index_path = dir.join(INDEX_FILE);
        if !index_path.exists() {
            return Err(AgentError::ExecutionError(format!(
                "No index found for store '{}'",
                store
            )));
        }

        let raw = fs::read_to_string(&index_path)
            .map_err(|e| AgentError::ExecutionError(format!("Failed to read index: {}", e)))?;
        let mut docs = Vec::new();
        for line in raw.lines().filter(|line| !line.trim().is_empty()) {
            let doc: String = serde_json::from_str(line)
                .map_err(|e| AgentError::ExecutionError(format!("Corrupt index entry: {}", e)))?;
            docs.push(doc);
        }

        let query_terms = terms(query);
        let mut scored: Vec<(usize, &String)> = docs
            .iter()
            .map(|doc| (overlap(&query_terms, doc), doc))
            .filter(|(score, _)| *score > 0)
            .collect();
        // stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        if scored.is_empty() {
            return Ok(vec![Content::text(format!(
                "No documents in store '{}' matched the query",
                store
            ))]);
        }

        Ok(scored
            .into_iter()
            .take(SEARCH_LIMIT)
            .map(|(_, doc)| Content::text(doc.clone()))
            .collect())
    }

    fn available_prompts(&self) -> Vec<Content> {
        let listing: Vec<String> = self
            .prompts
            .iter()
            .map(|prompt| format!("{}: {}", prompt.name, prompt.description))
            .collect();
        vec![Content::text(listing.join("\n"))]
    }

    fn list_stores(&self) -> AgentResult<String> {
        if !self.root.exists() {
            return Ok("(No document stores found)".to_string());
        }
        let entries = fs::read_dir(&self.root)
            .map_err(|e| AgentError::ExecutionError(format!("Failed to list stores: {}", e)))?;

        let mut stores = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|e| AgentError::ExecutionError(format!("Failed to list stores: {}", e)))?;
            if entry.path().join(INDEX_FILE).exists() {
                stores.push(format!("Store: {}", entry.file_name().to_string_lossy()));
            }
        }
        stores.sort();

        if stores.is_empty() {
            return Ok("(No document stores found)".to_string());
        }
        Ok(stores.join("\n"))
    }

    fn template_body(name: &str) -> Option<&'static str> {
        match name {
            "research_prompt" => Some(RESEARCH_PROMPT),
            _ => None,
        }
    }
}

fn terms(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|term| !term.is_empty())
        .map(str::to_string)
        .collect()
}

fn overlap(query_terms: &HashSet<String>, doc: &str) -> usize {
    let doc_terms = terms(doc);
    query_terms
        .iter()
        .filter(|term| doc_terms.contains(*term))
        .count()
}

#[async_trait]
impl Backend for OperationsBackend {
    fn name(&self) -> &str {
        "operations"
    }

    fn description(&self) -> &str {
        "Research operations: durable document stores with save and search"
    }

    fn instructions(&self) -> &str {
        "Use save_documents to persist findings worth keeping, and \
         search_documents to recall them later. Stores are named; the default \
         store is 'default'."
    }

    fn tools(&self) -> &[Tool] {
        &self.tools
    }

    fn prompts(&self) -> &[PromptTemplate] {
        &self.prompts
    }

    fn resources(&self) -> &[ResourceInfo] {
        &self.resources
    }

    async fn call(&self, tool_call: ToolCall) -> AgentResult<Vec<Content>> {
        match tool_call.name.as_str() {
            "save_documents" => self.save_documents(&tool_call.arguments),
            "search_documents" => self.search_documents(&tool_call.arguments),
            "available_prompts" => Ok(self.available_prompts()),
            _ => Err(AgentError::ToolNotFound(tool_call.name)),
        }
    }

    async fn read_resource(&self, uri: &str) -> AgentResult<String> {
        if uri == STORE_LIST_URI {
            self.list_stores()
        } else {
            Err(AgentError::ResourceNotFound(uri.to_string()))
        }
    }

    async fn render_prompt(
        &self,
        name: &str,
        arguments: &HashMap<String, String>,
    ) -> Result<Vec<String>, PromptError> {
        let template = self
            .prompts
            .iter()
            .find(|prompt| prompt.name == name)
            .ok_or_else(|| PromptError::NotFound(name.to_string()))?;

        let missing = template.missing_arguments(arguments);
        if !missing.is_empty() {
            return Err(PromptError::MissingParameters {
                prompt: name.to_string(),
                missing,
            });
        }

        let body = Self::template_body(name).ok_or_else(|| PromptError::NotFound(name.to_string()))?;
        let rendered = render_template(body, arguments).map_err(|e| PromptError::Render {
            prompt: name.to_string(),
            message: e.to_string(),
        })?;
        Ok(vec![rendered])
    }
}
