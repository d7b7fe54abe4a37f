use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named argument a prompt template accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptArgument {
    pub name: String,
    pub description: String,
    pub required: bool,
}

impl PromptArgument {
    pub fn required<N, D>(name: N, description: D) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        PromptArgument {
            name: name.into(),
            description: description.into(),
            required: true,
        }
    }
}

/// A backend-defined prompt template, optionally parameterized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub name: String,
    pub description: String,
    pub arguments: Vec<PromptArgument>,
}

impl PromptTemplate {
    pub fn new<N, D>(name: N, description: D, arguments: Vec<PromptArgument>) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        PromptTemplate {
            name: name.into(),
            description: description.into(),
            arguments,
        }
    }

    /// Names of required arguments absent from the provided mapping.
    pub fn missing_arguments(&self, provided: &HashMap<String, String>) -> Vec<String> {
        self.arguments
            .iter()
            .filter(|arg| arg.required && !provided.contains_key(&arg.name))
            .map(|arg| arg.name.clone())
            .collect()
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PromptError {
    /// Recoverable: the caller can collect the missing arguments and retry.
    #[error("Prompt '{prompt}' requires arguments: {missing:?}")]
    MissingParameters { prompt: String, missing: Vec<String> },

    #[error("Unknown prompt: {0}")]
    NotFound(String),

    #[error("Failed to render prompt '{prompt}': {message}")]
    Render { prompt: String, message: String },
}
