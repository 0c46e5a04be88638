//! Backend services.

pub mod browser;
pub mod clipboard;
pub mod copy_controller;
pub mod markdown_source;

pub use browser::open_markdown;
pub use clipboard::{ClipboardSink, SystemClipboard};
pub use copy_controller::{CopyController, CopyOutcome};
pub use markdown_source::{HttpMarkdownSource, MarkdownSource};
