//! Classification of a raw user line into plain chat or one of the reserved
//! directives understood by the session driver.

pub const RESOURCE_PREFIX: &str = "@resource:";
pub const PROMPT_PREFIX: &str = "@prompt:";
pub const USE_RESOURCE_PREFIX: &str = "@use_resource:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// The line matched no directive prefix; payload is the line itself.
    Chat(String),
    /// `@resource:<uri>` — fetch a resource and cache it.
    LoadResource(String),
    /// `@prompt:<name>` — resolve a named prompt template and run it.
    RunPrompt(String),
    /// `@use_resource:<uri> <query>` — ask a question against a cached resource.
    UseResource { uri: String, query: String },
}

impl Directive {
    /// Prefixes are matched exactly, case sensitive, and in a fixed order.
    /// There is no partial matching: anything that misses all three prefixes
    /// is chat.
    pub fn classify(line: &str) -> Directive {
        if let Some(rest) = line.strip_prefix(RESOURCE_PREFIX) {
            return Directive::LoadResource(unquote(rest));
        }
        if let Some(rest) = line.strip_prefix(PROMPT_PREFIX) {
            return Directive::RunPrompt(unquote(rest));
        }
        if let Some(rest) = line.strip_prefix(USE_RESOURCE_PREFIX) {
            let rest = rest.trim();
            // The URI runs to the first whitespace; everything after is the query.
            return match rest.split_once(char::is_whitespace) {
                Some((uri, query)) => Directive::UseResource {
                    uri: uri.trim().to_string(),
                    query: query.trim().to_string(),
                },
                None => Directive::UseResource {
                    uri: rest.to_string(),
                    query: String::new(),
                },
            };
        }
        Directive::Chat(line.to_string())
    }
}

fn unquote(raw: &str) -> String {
    raw.trim().trim_matches('"').to_string()
}
