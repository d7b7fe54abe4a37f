pub mod agent;
pub mod arguments;
pub mod backends;
pub mod compose;
pub mod directive;
pub mod errors;
pub mod models;
pub mod prompt_template;
pub mod providers;
pub mod resources;
