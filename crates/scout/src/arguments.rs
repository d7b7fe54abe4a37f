//! Parsing of the loosely formatted argument line a user supplies when a
//! prompt template asks for parameters.

use std::collections::HashMap;

use serde_json::Value;

/// Outcome of parsing an argument line.
///
/// `Parsed` with an empty map means the user supplied a well formed empty
/// object (`{}`); `Failed` means nothing could be extracted at all. Callers
/// must treat `Failed` as "ask the user again", never as "zero arguments
/// were intended".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedArguments {
    Parsed(HashMap<String, String>),
    Failed,
}

impl ParsedArguments {
    /// Parse an argument line, trying the supported formats in order:
    ///
    /// 1. a JSON object covering the whole string
    /// 2. comma separated `key:value` pairs, split at the first colon of each
    ///    segment; segments without a colon are dropped silently (a single
    ///    comma-less pair falls out of the same loop)
    ///
    /// Decode failures never escape; each one falls through to the next
    /// strategy.
    pub fn parse(raw: &str) -> ParsedArguments {
        let raw = raw.trim();

        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(raw) {
            let args = map.into_iter().map(|(k, v)| (k, stringify(v))).collect();
            return ParsedArguments::Parsed(args);
        }

        let mut args = HashMap::new();
        for segment in raw.split(',') {
            if let Some((key, value)) = segment.split_once(':') {
                args.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
        if !args.is_empty() {
            return ParsedArguments::Parsed(args);
        }

        ParsedArguments::Failed
    }
}

fn stringify(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
