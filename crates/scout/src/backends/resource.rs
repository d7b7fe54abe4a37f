use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Describes a resource a backend can serve, for discovery and diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceInfo {
    /// URI identifying the resource (e.g. "store://list")
    pub uri: String,
    /// Human readable name
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ResourceInfo {
    /// Creates a new ResourceInfo, validating the URI. The name falls back
    /// to the last path segment when not provided.
    pub fn new<S: AsRef<str>>(uri: S, name: Option<String>) -> Result<Self> {
        let uri = uri.as_ref();
        let url = Url::parse(uri).map_err(|e| anyhow!("Invalid URI '{}': {}", uri, e))?;

        let name = match name {
            Some(n) => n,
            None => url
                .path_segments()
                .and_then(|segments| segments.last())
                .filter(|segment| !segment.is_empty())
                .unwrap_or("unnamed")
                .to_string(),
        };

        Ok(Self {
            uri: uri.to_string(),
            name,
            description: None,
        })
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the scheme of the URI
    pub fn scheme(&self) -> Result<String> {
        let url = Url::parse(&self.uri)?;
        Ok(url.scheme().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_with_explicit_name() -> Result<()> {
        let info = ResourceInfo::new("store://list", Some("stores".to_string()))?
            .with_description("All known document stores");
        assert_eq!(info.uri, "store://list");
        assert_eq!(info.name, "stores");
        assert_eq!(info.scheme()?, "store");
        Ok(())
    }

    #[test]
    fn test_name_falls_back_to_path_segment() -> Result<()> {
        let info = ResourceInfo::new("file:///notes/summary.txt", None)?;
        assert_eq!(info.name, "summary.txt");
        Ok(())
    }

    #[test]
    fn test_invalid_uri() {
        assert!(ResourceInfo::new("not-a-uri", None).is_err());
    }
}
