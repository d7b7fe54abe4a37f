//! Session-lifetime cache of fetched resources, keyed by URI.

use std::collections::HashMap;

use tracing::info;

/// Maps a resource URI to its last fetched content. Last write wins; no
/// eviction, the map lives as long as the session does.
#[derive(Debug, Default)]
pub struct ResourceCache {
    entries: HashMap<String, String>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an entry. Returns true when an existing entry was
    /// replaced.
    pub fn put<U, C>(&mut self, uri: U, content: C) -> bool
    where
        U: Into<String>,
        C: Into<String>,
    {
        let uri = uri.into();
        let replaced = self.entries.insert(uri.clone(), content.into()).is_some();
        if replaced {
            info!(uri = %uri, "updated cached resource");
        } else {
            info!(uri = %uri, "cached new resource");
        }
        replaced
    }

    pub fn get(&self, uri: &str) -> Option<&str> {
        self.entries.get(uri).map(String::as_str)
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.entries.contains_key(uri)
    }

    /// All cached URIs, sorted so diagnostics render deterministically.
    pub fn uris(&self) -> Vec<&str> {
        let mut uris: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        uris.sort_unstable();
        uris
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_wins() {
        let mut cache = ResourceCache::new();
        assert!(!cache.put("x", "hello"));
        assert!(cache.put("x", "world"));
        assert_eq!(cache.get("x"), Some("world"));
    }

    #[test]
    fn test_get_absent_returns_none() {
        let cache = ResourceCache::new();
        assert_eq!(cache.get("y"), None);
        assert!(!cache.contains("y"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_uris_are_sorted() {
        let mut cache = ResourceCache::new();
        cache.put("b", "2");
        cache.put("a", "1");
        cache.put("c", "3");
        assert_eq!(cache.uris(), vec!["a", "b", "c"]);
    }
}
