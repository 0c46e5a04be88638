//! Configuration management.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::models::button::{DEFAULT_COPY_LABEL, DEFAULT_VIEW_LABEL};
use crate::models::{ButtonAttributes, ButtonWidth, CopyLabels, Page};

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Permalinks listed on startup
    #[serde(default)]
    pub pages: Vec<String>,
    #[serde(default)]
    pub copy_button: CopyButtonConfig,
    #[serde(default)]
    pub view_button: ViewButtonConfig,
}

/// "Copy for LLM" button configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyButtonConfig {
    #[serde(default = "default_copy_label")]
    pub label: String,
    #[serde(default = "default_label_copying")]
    pub label_copying: String,
    #[serde(default = "default_label_success")]
    pub label_success: String,
    #[serde(default = "default_label_error")]
    pub label_error: String,
    #[serde(default = "default_show_icon")]
    pub show_icon: bool,
    /// Width in percent of the button row (25, 50, 75 or 100)
    #[serde(default)]
    pub width: Option<ButtonWidth>,
}

impl Default for CopyButtonConfig {
    fn default() -> Self {
        Self {
            label: default_copy_label(),
            label_copying: default_label_copying(),
            label_success: default_label_success(),
            label_error: default_label_error(),
            show_icon: default_show_icon(),
            width: None,
        }
    }
}

/// "View as Markdown" button configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewButtonConfig {
    #[serde(default = "default_view_label")]
    pub label: String,
    #[serde(default = "default_show_icon")]
    pub show_icon: bool,
    #[serde(default)]
    pub width: Option<ButtonWidth>,
}

impl Default for ViewButtonConfig {
    fn default() -> Self {
        Self {
            label: default_view_label(),
            show_icon: default_show_icon(),
            width: None,
        }
    }
}

fn default_copy_label() -> String {
    DEFAULT_COPY_LABEL.to_string()
}

fn default_label_copying() -> String {
    CopyLabels::default().copying
}

fn default_label_success() -> String {
    CopyLabels::default().success
}

fn default_label_error() -> String {
    CopyLabels::default().error
}

fn default_view_label() -> String {
    DEFAULT_VIEW_LABEL.to_string()
}

fn default_show_icon() -> bool {
    true
}

impl CopyButtonConfig {
    /// Labels for each copy state.
    pub fn labels(&self) -> CopyLabels {
        CopyLabels {
            idle: self.label.clone(),
            copying: self.label_copying.clone(),
            success: self.label_success.clone(),
            error: self.label_error.clone(),
        }
    }

    pub fn attributes(&self) -> ButtonAttributes {
        ButtonAttributes {
            label: self.label.clone(),
            show_icon: self.show_icon,
            width: self.width,
        }
    }
}

impl ViewButtonConfig {
    pub fn attributes(&self) -> ButtonAttributes {
        ButtonAttributes {
            label: self.label.clone(),
            show_icon: self.show_icon,
            width: self.width,
        }
    }
}

impl Config {
    /// Load configuration from default location.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if config_path.exists() {
            Self::from_file(&config_path.to_string_lossy())
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: &str) -> Result<Self> {
        let expanded = expand_path(path);
        let content = std::fs::read_to_string(&expanded)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Get the default config path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("llm-copy")
            .join("config.toml")
    }

    /// Get the data directory (log files).
    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("llm-copy")
    }

    /// Configured pages followed by `extra` permalinks, duplicates dropped.
    pub fn pages(&self, extra: &[String]) -> Result<Vec<Page>, ConfigError> {
        let mut pages: Vec<Page> = Vec::new();
        for permalink in self.pages.iter().chain(extra) {
            let page = Page::new(permalink.as_str())?;
            if !pages.iter().any(|p| p.permalink == page.permalink) {
                pages.push(page);
            }
        }
        Ok(pages)
    }
}

/// Expand ~ to home directory.
fn expand_path(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path.to_string()
}
