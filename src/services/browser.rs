//! Opening markdown endpoints in the default browser.

use anyhow::{Context, Result};
use tracing::{info, warn};

/// Open `url` in the user's browser without waiting for it to exit.
pub fn open_markdown(url: &str) -> Result<()> {
    match open::that_detached(url) {
        Ok(()) => {
            info!(url, "opened markdown in browser");
            Ok(())
        }
        Err(e) => {
            warn!(url, error = %e, "failed to open browser");
            Err(e).with_context(|| format!("Failed to open browser for {}", url))
        }
    }
}
