//! The objects passed between the session driver, the agent, the model
//! provider, and the tool backends.
//!
//! The provider wire formats (openai-style chat completions) and the backend
//! call format both overlap with but do not match these structs exactly; the
//! provider layer converts at the edge so everything inside the crate speaks
//! one data model.
pub mod content;
pub mod message;
pub mod role;
pub mod tool;
