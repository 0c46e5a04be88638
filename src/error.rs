//! Error types.

use reqwest::StatusCode;
use thiserror::Error;

/// Why a copy attempt failed.
///
/// Every variant lands the button in the same `Error` state. The detail only
/// reaches the diagnostic log.
#[derive(Debug, Error)]
pub enum CopyError {
    /// The request never produced a response.
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered outside the 2xx range.
    #[error("HTTP {status} from {url}")]
    BadStatus { url: String, status: StatusCode },

    /// The response arrived but its body could not be read.
    #[error("failed to read body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The clipboard refused the write.
    #[error("clipboard write rejected: {0}")]
    ClipboardDenied(String),
}

/// Invalid values in the configuration file.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("button width must be one of 25, 50, 75 or 100 (got {0})")]
    InvalidWidth(u8),

    #[error("page permalink must not be empty")]
    EmptyPermalink,
}
