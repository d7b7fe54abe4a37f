//! Builds the literal text handed to the agent for a `@use_resource:` turn.

use crate::resources::ResourceCache;

/// Embed the cached resource verbatim ahead of the query, or surface an
/// explicit error block naming the missing URI and everything that is
/// cached, so the model sees what went wrong instead of a silently dropped
/// resource.
pub fn compose(query: &str, uri: &str, cache: &ResourceCache) -> String {
    match cache.get(uri) {
        Some(content) => format!("[USING RESOURCE: {uri}]\n{content}\n\nUser query: {query}"),
        None => format!(
            "[ERROR: Resource '{uri}' not found. Available resources: [{}]]\n\nUser query: {query}",
            cache.uris().join(", ")
        ),
    }
}
