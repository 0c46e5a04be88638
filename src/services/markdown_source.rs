//! Fetching markdown from a page's `.md` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::CopyError;

/// Where a copy button gets its markdown from.
#[async_trait]
pub trait MarkdownSource: Send + Sync {
    /// Fetch the full markdown body served at `url`.
    async fn fetch(&self, url: &str) -> Result<String, CopyError>;
}

/// HTTP implementation backed by a shared reqwest client.
///
/// No request timeout is configured: an in-flight copy always runs to
/// completion.
#[derive(Debug, Clone)]
pub struct HttpMarkdownSource {
    client: Client,
}

impl HttpMarkdownSource {
    /// Create a source with a fresh client.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("llm-copy/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl MarkdownSource for HttpMarkdownSource {
    async fn fetch(&self, url: &str) -> Result<String, CopyError> {
        debug!(url, "fetching markdown");

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "text/markdown, text/plain;q=0.9, */*;q=0.1")
            .send()
            .await
            .map_err(|source| CopyError::Network {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CopyError::BadStatus {
                url: url.to_string(),
                status,
            });
        }

        let text = response.text().await.map_err(|source| CopyError::Body {
            url: url.to_string(),
            source,
        })?;

        debug!(url, bytes = text.len(), "markdown fetched");
        Ok(text)
    }
}
