//! Clipboard operations.
//!
//! On X11 and Wayland the process that wrote the clipboard has to keep
//! serving it, so the system clipboard lives on one worker thread for the
//! whole run instead of being opened per copy.

use async_trait::async_trait;
use std::io;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::error::CopyError;

/// Destination for copied markdown.
#[async_trait]
pub trait ClipboardSink: Send + Sync {
    /// Replace the clipboard contents with `text`.
    async fn write_text(&self, text: String) -> Result<(), CopyError>;
}

/// What the worker thread needs from a clipboard.
trait ClipboardBackend {
    fn set_text(&mut self, text: &str) -> Result<(), CopyError>;

    /// Re-offer `text` and block until another program replaces it.
    fn hold(&mut self, text: &str) -> Result<(), CopyError>;
}

fn denied(e: arboard::Error) -> CopyError {
    CopyError::ClipboardDenied(e.to_string())
}

impl ClipboardBackend for arboard::Clipboard {
    fn set_text(&mut self, text: &str) -> Result<(), CopyError> {
        arboard::Clipboard::set_text(self, text).map_err(denied)
    }

    #[cfg(all(
        unix,
        not(any(target_os = "macos", target_os = "android", target_os = "emscripten"))
    ))]
    fn hold(&mut self, text: &str) -> Result<(), CopyError> {
        use arboard::SetExtLinux;
        self.set().wait().text(text).map_err(denied)
    }

    #[cfg(not(all(
        unix,
        not(any(target_os = "macos", target_os = "android", target_os = "emscripten"))
    )))]
    fn hold(&mut self, _text: &str) -> Result<(), CopyError> {
        // The OS keeps the contents after we exit.
        Ok(())
    }
}

enum Request {
    Write {
        text: String,
        reply: oneshot::Sender<Result<(), CopyError>>,
    },
    Hold {
        reply: oneshot::Sender<Result<(), CopyError>>,
    },
}

/// The system clipboard, via arboard.
///
/// Clones share one worker and one clipboard handle. The handle is opened on
/// the first write and kept until the last clone is dropped.
#[derive(Debug, Clone)]
pub struct SystemClipboard {
    requests: mpsc::UnboundedSender<Request>,
}

impl SystemClipboard {
    /// Start the clipboard worker thread.
    pub fn new() -> io::Result<Self> {
        Self::spawn(|| arboard::Clipboard::new().map_err(denied))
    }

    fn spawn<B, F>(open: F) -> io::Result<Self>
    where
        B: ClipboardBackend,
        F: Fn() -> Result<B, CopyError> + Send + 'static,
    {
        let (requests, rx) = mpsc::unbounded_channel();
        std::thread::Builder::new()
            .name("clipboard".into())
            .spawn(move || serve(rx, open))?;
        Ok(Self { requests })
    }

    /// Keep serving the last copied text until another program takes the
    /// clipboard over. Returns at once where the OS retains clipboard
    /// contents itself, or when nothing was copied.
    pub async fn hold_until_replaced(&self) -> Result<(), CopyError> {
        let (reply, response) = oneshot::channel();
        self.send(Request::Hold { reply }, response).await
    }

    async fn send(
        &self,
        request: Request,
        response: oneshot::Receiver<Result<(), CopyError>>,
    ) -> Result<(), CopyError> {
        let stopped = || CopyError::ClipboardDenied("clipboard worker stopped".into());
        self.requests.send(request).map_err(|_| stopped())?;
        response.await.map_err(|_| stopped())?
    }
}

#[async_trait]
impl ClipboardSink for SystemClipboard {
    async fn write_text(&self, text: String) -> Result<(), CopyError> {
        let (reply, response) = oneshot::channel();
        self.send(Request::Write { text, reply }, response).await
    }
}

/// Worker loop. Runs until every `SystemClipboard` clone is gone.
fn serve<B, F>(mut requests: mpsc::UnboundedReceiver<Request>, open: F)
where
    B: ClipboardBackend,
    F: Fn() -> Result<B, CopyError>,
{
    let mut backend: Option<B> = None;
    let mut last: Option<String> = None;

    while let Some(request) = requests.blocking_recv() {
        match request {
            Request::Write { text, reply } => {
                // A failed open is retried on the next write.
                let result = match backend.take().map_or_else(|| open(), Ok) {
                    Ok(mut clipboard) => {
                        let written = clipboard.set_text(&text);
                        backend = Some(clipboard);
                        written
                    }
                    Err(e) => Err(e),
                };
                if result.is_ok() {
                    debug!(bytes = text.len(), "clipboard written");
                    last = Some(text);
                }
                let _ = reply.send(result);
            }
            Request::Hold { reply } => {
                let result = match (backend.as_mut(), last.as_deref()) {
                    (Some(clipboard), Some(text)) => {
                        debug!(bytes = text.len(), "holding clipboard until replaced");
                        clipboard.hold(text)
                    }
                    _ => Ok(()),
                };
                let _ = reply.send(result);
            }
        }
    }
}
