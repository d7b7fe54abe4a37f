use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;
use futures::StreamExt;

use crate::prompt::{InputType, Prompt};
use crate::session::session_file::persist_messages;
use scout::agent::Agent;
use scout::arguments::ParsedArguments;
use scout::backends::PromptError;
use scout::compose::compose;
use scout::directive::{Directive, RESOURCE_PREFIX, USE_RESOURCE_PREFIX};
use scout::models::message::{Message, MessageContent};
use scout::models::role::Role;
use scout::resources::ResourceCache;

pub struct Session<'a> {
    agent: Box<Agent>,
    prompt: Box<dyn Prompt + 'a>,
    cache: ResourceCache,
    session_file: PathBuf,
}

impl<'a> Session<'a> {
    pub fn new(agent: Box<Agent>, prompt: Box<dyn Prompt + 'a>, session_file: PathBuf) -> Self {
        Session {
            agent,
            prompt,
            cache: ResourceCache::new(),
            session_file,
        }
    }

    pub async fn start(&mut self) -> Result<()> {
        self.setup_session();

        let mut messages = Vec::new();

        loop {
            let input = self.prompt.get_input()?;
            let line = match input.input_type {
                InputType::Message => match input.content {
                    Some(line) => line,
                    None => continue,
                },
                InputType::Exit => break,
                InputType::AskAgain => continue,
            };
            // a blank line would otherwise become an empty chat turn
            if line.trim().is_empty() {
                continue;
            }

            match Directive::classify(&line) {
                Directive::Chat(text) => self.send_turn(text, &mut messages).await?,
                Directive::LoadResource(uri) => self.load_resource(&uri).await,
                Directive::RunPrompt(name) => self.run_prompt(&name, &mut messages).await?,
                Directive::UseResource { uri, query } => {
                    self.use_resource(&uri, &query, &mut messages).await?
                }
            }
        }
        self.close_session();
        Ok(())
    }

    /// Fetch a resource into the session cache. The conversation is not
    /// touched, success or failure.
    async fn load_resource(&mut self, uri: &str) {
        match self.agent.read_resource(uri).await {
            Ok(content) => {
                let replaced = self.cache.put(uri, content);
                let verb = if replaced { "Updated" } else { "Loaded" };
                self.prompt.render(raw_message(&format!(
                    "{} resource {} in the session cache.\n",
                    verb, uri
                )));
            }
            Err(e) => {
                self.prompt
                    .render(raw_message(&format!("Failed to load resource {}: {}\n", uri, e)));
            }
        }
    }

    /// Resolve a named prompt template and send the rendered text as a turn.
    /// When the template wants arguments, ask for them once; an argument line
    /// that parses to nothing aborts the turn rather than silently running
    /// with zero arguments.
    async fn run_prompt(&mut self, name: &str, messages: &mut Vec<Message>) -> Result<()> {
        let rendered = match self.agent.render_prompt(name, &HashMap::new()).await {
            Ok(rendered) => rendered,
            Err(PromptError::MissingParameters { missing, .. }) => {
                let input = self.prompt.get_argument_input(name, &missing)?;
                let raw = match input.input_type {
                    InputType::Message => input.content.unwrap_or_default(),
                    _ => return Ok(()),
                };

                let args = match ParsedArguments::parse(&raw) {
                    ParsedArguments::Parsed(args) => args,
                    ParsedArguments::Failed => {
                        self.prompt.render(raw_message(&format!(
                            "Could not parse arguments for prompt '{}'. \
                             Give key: value pairs, comma separated, or a JSON object.\n",
                            name
                        )));
                        return Ok(());
                    }
                };

                match self.agent.render_prompt(name, &args).await {
                    Ok(rendered) => rendered,
                    Err(e) => {
                        self.prompt.render(raw_message(&format!("{}\n", e)));
                        return Ok(());
                    }
                }
            }
            Err(e) => {
                self.prompt.render(raw_message(&format!("{}\n", e)));
                return Ok(());
            }
        };

        self.send_turn(rendered.join("\n"), messages).await
    }

    /// Answer a query against a cached resource. Requires the resource to
    /// have been loaded earlier in this session.
    async fn use_resource(
        &mut self,
        uri: &str,
        query: &str,
        messages: &mut Vec<Message>,
    ) -> Result<()> {
        if query.is_empty() {
            self.prompt.render(raw_message(&format!(
                "Usage: {}<uri> <query>\n",
                USE_RESOURCE_PREFIX
            )));
            return Ok(());
        }
        if !self.cache.contains(uri) {
            self.prompt.render(raw_message(&format!(
                "Resource {} is not cached. Load it first with {}{}\n",
                uri, RESOURCE_PREFIX, uri
            )));
            return Ok(());
        }

        let content = compose(query, uri, &self.cache);
        self.send_turn(content, messages).await
    }

    async fn send_turn(&mut self, content: String, messages: &mut Vec<Message>) -> Result<()> {
        messages.push(Message::user().with_text(&content));
        persist_messages(&self.session_file, messages)?;

        self.prompt.show_busy();
        self.agent_process_messages(messages).await;
        self.prompt.hide_busy();
        Ok(())
    }

    async fn agent_process_messages(&mut self, messages: &mut Vec<Message>) {
        let mut stream = match self.agent.reply(messages).await {
            Ok(stream) => stream,
            Err(e) => {
                eprintln!("Error starting reply stream: {}", e);
                return;
            }
        };
        loop {
            tokio::select! {
                response = stream.next() => {
                    match response {
                        Some(Ok(message)) => {
                            messages.push(message.clone());
                            persist_messages(&self.session_file, messages).unwrap_or_else(|e| eprintln!("Failed to persist messages: {}", e));
                            self.prompt.render(Box::new(message.clone()));
                        }
                        Some(Err(e)) => {
                            self.prompt.render(raw_message(&format!("Error: {}\n", e)));
                            break;
                        }
                        None => break,
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    drop(stream);
                    rewind_to_before_last_user_turn(messages);
                    persist_messages(&self.session_file, messages).unwrap_or_else(|e| eprintln!("Failed to persist messages: {}", e));

                    self.prompt.render(raw_message(" Interrupt: Resetting conversation to before the last sent message...\n"));
                    break;
                }
            }
        }
    }

    fn setup_session(&mut self) {
        self.prompt.render(raw_message(
            format!(
                "Starting session. Recording to {}\n",
                self.session_file.display()
            )
            .as_str(),
        ));
    }

    fn close_session(&mut self) {
        self.prompt.render(raw_message(
            format!(
                "Closing session. Recorded to {}\n",
                self.session_file.display()
            )
            .as_str(),
        ));
        self.prompt.close();
    }
}

fn raw_message(content: &str) -> Box<Message> {
    Box::new(Message::assistant().with_text(content))
}

/// Drop everything back to before the most recent user-authored turn,
/// including that turn itself. Tool-result messages also carry `Role::User`
/// on the wire, so role alone does not mark the turn boundary; stopping at
/// one would strand an assistant message with unanswered tool requests at
/// the tail, which the provider rejects on every later call.
fn rewind_to_before_last_user_turn(messages: &mut Vec<Message>) {
    while let Some(message) = messages.pop() {
        let is_user_turn = message.role == Role::User
            && message
                .content
                .iter()
                .all(|content| !matches!(content, MessageContent::ToolResponse(_)));
        if is_user_turn {
            break;
        }
    }
}
