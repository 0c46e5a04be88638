//! Pages and their markdown endpoints.

use crate::error::ConfigError;

/// A page that has a markdown rendition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Canonical URL (e.g., "https://example.com/blog/hello-world/")
    pub permalink: String,
    /// Display name (last path segment, e.g., "hello-world")
    pub display_name: String,
}

impl Page {
    /// Create a page from its permalink.
    pub fn new(permalink: impl Into<String>) -> Result<Self, ConfigError> {
        let permalink = permalink.into().trim().to_string();
        if permalink.is_empty() {
            return Err(ConfigError::EmptyPermalink);
        }

        let display_name = display_name_for(&permalink);

        Ok(Self {
            permalink,
            display_name,
        })
    }

    /// URL serving this page as plain markdown.
    pub fn markdown_url(&self) -> String {
        markdown_url(&self.permalink)
    }
}

/// Derive the markdown endpoint for a permalink.
/// e.g., "https://example.com/hello-world/" -> "https://example.com/hello-world.md"
pub fn markdown_url(permalink: &str) -> String {
    format!("{}.md", permalink.trim_end_matches('/'))
}

/// Last non-empty path segment, falling back to the host.
fn display_name_for(permalink: &str) -> String {
    let without_scheme = permalink
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(permalink);

    without_scheme
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or(without_scheme)
        .to_string()
}
