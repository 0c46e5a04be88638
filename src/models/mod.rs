//! Data models for pages and their buttons.

pub mod button;
pub mod page;

pub use button::{ButtonAttributes, ButtonWidth, CopyContext, CopyLabels, CopyState};
pub use page::{markdown_url, Page};
