use std::io::{self, Write};

use anyhow::Result;
use bat::WrappingMode;
use cliclack::spinner;
use console::style;
use scout::models::content::Content;
use scout::models::message::{Message, MessageContent, ToolRequest, ToolResponse};
use scout::models::tool::ToolCall;
use serde_json::Value;

use super::{thinking::get_random_thinking_message, Input, InputType, Prompt, Theme};

const PROMPT: &str = "\x1b[1m\x1b[38;5;30m( O)> \x1b[0m";
const MAX_STRING_LENGTH: usize = 40;
const INDENT: &str = "    ";

pub struct RustylinePrompt {
    spinner: cliclack::ProgressBar,
    theme: Theme,
}

impl RustylinePrompt {
    pub fn new() -> Self {
        RustylinePrompt {
            spinner: spinner(),
            theme: Theme::Dark,
        }
    }

    fn theme_name(&self) -> &'static str {
        match self.theme {
            Theme::Light => "GitHub",
            Theme::Dark => "zenburn",
        }
    }

    fn render_tool_request(&self, tool_request: &ToolRequest) {
        match &tool_request.tool_call {
            Ok(call) => {
                print_request_header(call);
                print_params(&call.arguments, 0);
                print_newline();
            }
            Err(e) => print_markdown(&e.to_string(), self.theme_name()),
        }
    }

    fn render_tool_response(&self, tool_response: &ToolResponse) {
        match &tool_response.tool_result {
            Ok(contents) => {
                for content in contents {
                    let Content::Text(text) = content;
                    print_markdown(&text.text, self.theme_name());
                }
            }
            Err(e) => print_markdown(&e.to_string(), self.theme_name()),
        }
    }
}

fn print_request_header(call: &ToolCall) {
    let tool_header = format!(
        "─── {} ──────────────────────────",
        style(&call.name).magenta(),
    );
    print_newline();
    println!("{}", tool_header);
}

fn print_markdown(content: &str, theme: &str) {
    bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()))
        .theme(theme)
        .language("Markdown")
        .wrapping_mode(WrappingMode::Character)
        .print()
        .unwrap();
}

/// Format and print parameters recursively with proper indentation and colors
fn print_params(value: &Value, depth: usize) {
    let indent = INDENT.repeat(depth);

    match value {
        Value::Object(map) => {
            for (key, val) in map {
                match val {
                    Value::Object(_) | Value::Array(_) => {
                        println!("{}{}:", indent, style(key).dim());
                        print_params(val, depth + 1);
                    }
                    Value::String(s) => {
                        if s.len() > MAX_STRING_LENGTH {
                            println!("{}{}: {}", indent, style(key).dim(), style("...").dim());
                        } else {
                            println!("{}{}: {}", indent, style(key).dim(), style(s).green());
                        }
                    }
                    Value::Number(n) => {
                        println!("{}{}: {}", indent, style(key).dim(), style(n).blue());
                    }
                    Value::Bool(b) => {
                        println!("{}{}: {}", indent, style(key).dim(), style(b).blue());
                    }
                    Value::Null => {
                        println!("{}{}: {}", indent, style(key).dim(), style("null").dim());
                    }
                }
            }
        }
        Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                println!("{}{}.", indent, i + 1);
                print_params(item, depth + 1);
            }
        }
        Value::String(s) => {
            if s.len() > MAX_STRING_LENGTH {
                println!(
                    "{}{}",
                    indent,
                    style(format!("[{} chars]", s.len())).yellow()
                );
            } else {
                println!("{}{}", indent, style(s).green());
            }
        }
        other => {
            println!("{}{}", indent, style(other).yellow());
        }
    }
}

fn print_newline() {
    println!();
}

fn read_line(prompt: &str) -> Result<Option<String>> {
    let mut editor = rustyline::DefaultEditor::new()?;
    match editor.readline(prompt) {
        Ok(text) => Ok(Some(text.trim().to_string())),
        Err(e) => {
            match e {
                rustyline::error::ReadlineError::Interrupted => (),
                _ => eprintln!("Input error: {}", e),
            }
            Ok(None)
        }
    }
}

impl Prompt for RustylinePrompt {
    fn render(&mut self, message: Box<Message>) {
        for message_content in &message.content {
            match message_content {
                MessageContent::Text(text) => print_markdown(&text.text, self.theme_name()),
                MessageContent::ToolRequest(tool_request) => self.render_tool_request(tool_request),
                MessageContent::ToolResponse(tool_response) => {
                    self.render_tool_response(tool_response)
                }
            }
        }

        print_newline();
        io::stdout().flush().expect("Failed to flush stdout");
    }

    fn show_busy(&mut self) {
        self.spinner = spinner();
        self.spinner
            .start(format!("{}...", get_random_thinking_message()));
    }

    fn hide_busy(&self) {
        self.spinner.stop("");
    }

    fn get_input(&mut self) -> Result<Input> {
        let message_text = match read_line(PROMPT)? {
            Some(text) => text,
            None => {
                return Ok(Input {
                    input_type: InputType::Exit,
                    content: None,
                })
            }
        };

        if message_text.eq_ignore_ascii_case("exit") || message_text.eq_ignore_ascii_case("quit") {
            Ok(Input {
                input_type: InputType::Exit,
                content: None,
            })
        } else if message_text.eq_ignore_ascii_case("/t") {
            self.theme = match self.theme {
                Theme::Light => {
                    println!("Switching to Dark theme");
                    Theme::Dark
                }
                Theme::Dark => {
                    println!("Switching to Light theme");
                    Theme::Light
                }
            };
            Ok(Input {
                input_type: InputType::AskAgain,
                content: None,
            })
        } else {
            Ok(Input {
                input_type: InputType::Message,
                content: Some(message_text),
            })
        }
    }

    fn get_argument_input(&mut self, prompt_name: &str, missing: &[String]) -> Result<Input> {
        println!(
            "Prompt '{}' needs: {}",
            style(prompt_name).cyan(),
            style(missing.join(", ")).green()
        );
        println!(
            "{}",
            style("Enter key: value pairs, comma separated, or a JSON object").dim()
        );

        match read_line("Arguments: ")? {
            Some(text) => Ok(Input {
                input_type: InputType::Message,
                content: Some(text),
            }),
            None => Ok(Input {
                input_type: InputType::AskAgain,
                content: None,
            }),
        }
    }

    fn close(&self) {
        // No cleanup required
    }
}
