//! Button state and render-time configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default label for the copy button.
pub const DEFAULT_COPY_LABEL: &str = "Copy for LLM";
/// Default label for the view button.
pub const DEFAULT_VIEW_LABEL: &str = "View as Markdown";

/// Progress of a single copy button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CopyState {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

impl CopyState {
    /// Label shown for this state.
    pub fn label<'a>(&self, labels: &'a CopyLabels) -> &'a str {
        match self {
            CopyState::Idle => &labels.idle,
            CopyState::Loading => &labels.copying,
            CopyState::Success => &labels.success,
            CopyState::Error => &labels.error,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, CopyState::Loading)
    }

    /// The button ignores activation while disabled.
    pub fn is_disabled(&self) -> bool {
        self.is_loading()
    }
}

/// The four labels a copy button cycles through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyLabels {
    pub idle: String,
    pub copying: String,
    pub success: String,
    pub error: String,
}

impl Default for CopyLabels {
    fn default() -> Self {
        Self {
            idle: DEFAULT_COPY_LABEL.to_string(),
            copying: "Copying...".to_string(),
            success: "Copied!".to_string(),
            error: "Failed".to_string(),
        }
    }
}

/// Immutable per-button configuration, fixed when the button is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyContext {
    /// Markdown endpoint to fetch
    pub md_url: String,
    pub labels: CopyLabels,
}

impl CopyContext {
    pub fn new(md_url: impl Into<String>, labels: CopyLabels) -> Self {
        Self {
            md_url: md_url.into(),
            labels,
        }
    }
}

/// Button width as a percentage of the available row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ButtonWidth(u8);

impl ButtonWidth {
    pub const ALLOWED: [u8; 4] = [25, 50, 75, 100];

    pub fn percent(&self) -> u16 {
        u16::from(self.0)
    }
}

impl TryFrom<u8> for ButtonWidth {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if Self::ALLOWED.contains(&value) {
            Ok(Self(value))
        } else {
            Err(ConfigError::InvalidWidth(value))
        }
    }
}

impl From<ButtonWidth> for u8 {
    fn from(width: ButtonWidth) -> Self {
        width.0
    }
}

/// Presentation attributes shared by both button kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonAttributes {
    pub label: String,
    pub show_icon: bool,
    pub width: Option<ButtonWidth>,
}
