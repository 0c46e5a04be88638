//! Copy-for-LLM workflow.
//!
//! Each copy button owns one [`CopyController`]. Activating it fetches the
//! page's markdown, writes it to the clipboard and walks the button through
//! `Idle -> Loading -> Success | Error -> Idle`. The reset to `Idle` happens a
//! fixed [`RESET_DELAY`] after the attempt settles, whatever the outcome.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info};

use crate::error::CopyError;
use crate::models::{CopyContext, CopyState};
use crate::services::{ClipboardSink, MarkdownSource};

/// How long the success/error label stays up before the button resets.
pub const RESET_DELAY: Duration = Duration::from_millis(2000);

/// One attempt publishes at most three transitions.
const TRANSITION_CAPACITY: usize = 16;

/// Result of one call to [`CopyController::run_copy`].
#[derive(Debug)]
pub enum CopyOutcome {
    /// Another attempt was already in flight; nothing happened.
    Skipped,
    /// The markdown is on the clipboard.
    Copied { bytes: usize },
    /// Fetching or writing failed.
    Failed(CopyError),
}

/// Per-button controller. Cloning shares the same button state.
#[derive(Clone)]
pub struct CopyController {
    inner: Arc<Inner>,
}

struct Inner {
    context: CopyContext,
    state: watch::Sender<CopyState>,
    /// Every transition in order, for consumers that must not miss one.
    transitions: broadcast::Sender<CopyState>,
    /// Bumped on every accepted activation. A delayed reset only applies if
    /// its activation is still the latest one.
    generation: AtomicU64,
    source: Arc<dyn MarkdownSource>,
    clipboard: Arc<dyn ClipboardSink>,
}

impl CopyController {
    pub fn new(
        context: CopyContext,
        source: Arc<dyn MarkdownSource>,
        clipboard: Arc<dyn ClipboardSink>,
    ) -> Self {
        let (state, _) = watch::channel(CopyState::Idle);
        let (transitions, _) = broadcast::channel(TRANSITION_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                context,
                state,
                transitions,
                generation: AtomicU64::new(0),
                source,
                clipboard,
            }),
        }
    }

    pub fn context(&self) -> &CopyContext {
        &self.inner.context
    }

    /// Current state.
    pub fn state(&self) -> CopyState {
        *self.inner.state.borrow()
    }

    /// Receive every transition from now on, without coalescing.
    pub fn transitions(&self) -> broadcast::Receiver<CopyState> {
        self.inner.transitions.subscribe()
    }

    /// Label to render for the current state.
    pub fn displayed_label(&self) -> &str {
        self.state().label(&self.inner.context.labels)
    }

    pub fn is_loading(&self) -> bool {
        self.state().is_loading()
    }

    pub fn is_disabled(&self) -> bool {
        self.state().is_disabled()
    }

    /// Start a copy in the background. Ignored while one is in flight.
    ///
    /// Must be called from within a tokio runtime.
    pub fn activate_copy(&self) {
        let Some(generation) = self.try_begin() else {
            debug!(url = %self.inner.context.md_url, "copy already in flight, ignoring");
            return;
        };

        let controller = self.clone();
        tokio::spawn(async move {
            controller.run_from(generation).await;
        });
    }

    /// Run a copy to completion, including the reset delay.
    pub async fn run_copy(&self) -> CopyOutcome {
        match self.try_begin() {
            Some(generation) => self.run_from(generation).await,
            None => CopyOutcome::Skipped,
        }
    }

    /// Move to `Loading` unless already there. Returns the new generation.
    ///
    /// The check and the write happen under the channel lock, so two callers
    /// can never both start.
    fn try_begin(&self) -> Option<u64> {
        let mut generation = None;
        self.inner.state.send_if_modified(|state| {
            if state.is_loading() {
                return false;
            }
            *state = CopyState::Loading;
            generation = Some(self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1);
            self.publish(CopyState::Loading);
            true
        });
        generation
    }

    /// Record a settled state. Published under the channel lock so
    /// transitions from overlapping attempts stay ordered.
    fn settle(&self, new_state: CopyState) {
        self.inner.state.send_modify(|state| {
            *state = new_state;
            self.publish(new_state);
        });
    }

    fn publish(&self, state: CopyState) {
        // No subscribers is the normal case under the TUI.
        let _ = self.inner.transitions.send(state);
    }

    async fn run_from(&self, generation: u64) -> CopyOutcome {
        let url = &self.inner.context.md_url;

        let outcome = match self.fetch_and_copy().await {
            Ok(bytes) => {
                info!(url = %url, bytes, "copied markdown to clipboard");
                self.settle(CopyState::Success);
                CopyOutcome::Copied { bytes }
            }
            Err(err) => {
                error!(url = %url, error = %err, "Copy failed");
                self.settle(CopyState::Error);
                CopyOutcome::Failed(err)
            }
        };

        tokio::time::sleep(RESET_DELAY).await;

        self.inner.state.send_if_modified(|state| {
            if self.inner.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *state = CopyState::Idle;
            self.publish(CopyState::Idle);
            true
        });

        outcome
    }

    async fn fetch_and_copy(&self) -> Result<usize, CopyError> {
        let markdown = self.inner.source.fetch(&self.inner.context.md_url).await?;
        let bytes = markdown.len();
        self.inner.clipboard.write_text(markdown).await?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CopyLabels;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use tokio::sync::Semaphore;
    use tokio::time::Instant;
    use tracing_subscriber::fmt::MakeWriter;

    /// Serves a fixed response, optionally held until `gate` gets a permit.
    struct FakeSource {
        response: Result<String, StatusCode>,
        calls: AtomicUsize,
        gate: Option<Arc<Semaphore>>,
    }

    impl FakeSource {
        fn ok(body: &str) -> Self {
            Self {
                response: Ok(body.to_string()),
                calls: AtomicUsize::new(0),
                gate: None,
            }
        }

        fn status(status: StatusCode) -> Self {
            Self {
                response: Err(status),
                calls: AtomicUsize::new(0),
                gate: None,
            }
        }

        fn gated(mut self, gate: Arc<Semaphore>) -> Self {
            self.gate = Some(gate);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MarkdownSource for FakeSource {
        async fn fetch(&self, url: &str) -> Result<String, CopyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }
            match &self.response {
                Ok(body) => Ok(body.clone()),
                Err(status) => Err(CopyError::BadStatus {
                    url: url.to_string(),
                    status: *status,
                }),
            }
        }
    }

    /// Records every write; rejects them all when `deny` is set.
    #[derive(Default)]
    struct FakeClipboard {
        contents: Mutex<Option<String>>,
        attempts: Mutex<Vec<String>>,
        deny: bool,
    }

    impl FakeClipboard {
        fn with_contents(text: &str) -> Self {
            Self {
                contents: Mutex::new(Some(text.to_string())),
                ..Default::default()
            }
        }

        fn denying() -> Self {
            Self {
                deny: true,
                ..Default::default()
            }
        }

        fn contents(&self) -> Option<String> {
            self.contents.lock().unwrap().clone()
        }

        fn attempts(&self) -> Vec<String> {
            self.attempts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ClipboardSink for FakeClipboard {
        async fn write_text(&self, text: String) -> Result<(), CopyError> {
            self.attempts.lock().unwrap().push(text.clone());
            if self.deny {
                return Err(CopyError::ClipboardDenied("permission denied".to_string()));
            }
            *self.contents.lock().unwrap() = Some(text);
            Ok(())
        }
    }

    /// Collects formatted log output in memory.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn watch_states(controller: &CopyController) -> watch::Receiver<CopyState> {
        controller.inner.state.subscribe()
    }

    fn controller(source: Arc<FakeSource>, clipboard: Arc<FakeClipboard>) -> CopyController {
        let context = CopyContext::new("https://example.com/hello.md", CopyLabels::default());
        CopyController::new(context, source, clipboard)
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_walks_idle_loading_success_idle() {
        let gate = Arc::new(Semaphore::new(0));
        let source = Arc::new(FakeSource::ok("# Hello").gated(gate.clone()));
        let clipboard = Arc::new(FakeClipboard::default());
        let controller = controller(source.clone(), clipboard.clone());
        let mut rx = watch_states(&controller);

        assert_eq!(controller.state(), CopyState::Idle);

        let task = tokio::spawn({
            let controller = controller.clone();
            async move { controller.run_copy().await }
        });

        rx.wait_for(|s| *s == CopyState::Loading).await.unwrap();
        assert!(controller.is_loading());
        assert!(controller.is_disabled());

        gate.add_permits(1);
        rx.wait_for(|s| *s == CopyState::Success).await.unwrap();
        assert_eq!(clipboard.contents().as_deref(), Some("# Hello"));

        rx.wait_for(|s| *s == CopyState::Idle).await.unwrap();
        let outcome = task.await.unwrap();
        assert!(matches!(outcome, CopyOutcome::Copied { bytes: 7 }));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bad_status_leaves_clipboard_untouched() {
        let source = Arc::new(FakeSource::status(StatusCode::NOT_FOUND));
        let clipboard = Arc::new(FakeClipboard::with_contents("previous"));
        let controller = controller(source, clipboard.clone());
        let mut rx = watch_states(&controller);

        let task = tokio::spawn({
            let controller = controller.clone();
            async move { controller.run_copy().await }
        });

        rx.wait_for(|s| *s == CopyState::Error).await.unwrap();
        assert_eq!(controller.displayed_label(), "Failed");
        assert!(!controller.is_disabled());

        let outcome = task.await.unwrap();
        assert!(matches!(
            outcome,
            CopyOutcome::Failed(CopyError::BadStatus { status, .. }) if status == StatusCode::NOT_FOUND
        ));
        assert_eq!(controller.state(), CopyState::Idle);
        assert_eq!(clipboard.contents().as_deref(), Some("previous"));
        assert!(clipboard.attempts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clipboard_rejection_after_body_read() {
        let source = Arc::new(FakeSource::ok("# Hello"));
        let clipboard = Arc::new(FakeClipboard::denying());
        let controller = controller(source.clone(), clipboard.clone());
        let mut rx = watch_states(&controller);

        let task = tokio::spawn({
            let controller = controller.clone();
            async move { controller.run_copy().await }
        });

        rx.wait_for(|s| *s == CopyState::Error).await.unwrap();
        assert_eq!(source.calls(), 1);
        assert_eq!(clipboard.attempts(), vec!["# Hello".to_string()]);

        let outcome = task.await.unwrap();
        assert!(matches!(
            outcome,
            CopyOutcome::Failed(CopyError::ClipboardDenied(_))
        ));
        assert_eq!(controller.state(), CopyState::Idle);
        assert_eq!(clipboard.contents(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_activations_fetch_once() {
        let gate = Arc::new(Semaphore::new(0));
        let source = Arc::new(FakeSource::ok("# Hello").gated(gate.clone()));
        let clipboard = Arc::new(FakeClipboard::default());
        let controller = controller(source.clone(), clipboard.clone());
        let mut rx = watch_states(&controller);

        for _ in 0..5 {
            controller.activate_copy();
        }
        assert_eq!(controller.state(), CopyState::Loading);

        let skipped = controller.run_copy().await;
        assert!(matches!(skipped, CopyOutcome::Skipped));

        gate.add_permits(1);
        rx.wait_for(|s| *s == CopyState::Success).await.unwrap();
        rx.wait_for(|s| *s == CopyState::Idle).await.unwrap();

        assert_eq!(source.calls(), 1);
        assert_eq!(clipboard.attempts().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_happens_exactly_after_delay() {
        let source = Arc::new(FakeSource::ok("# Hello"));
        let clipboard = Arc::new(FakeClipboard::default());
        let controller = controller(source, clipboard);
        let mut rx = watch_states(&controller);

        let task = tokio::spawn({
            let controller = controller.clone();
            async move { controller.run_copy().await }
        });

        rx.wait_for(|s| *s == CopyState::Success).await.unwrap();
        let settled_at = Instant::now();

        tokio::time::sleep(RESET_DELAY - Duration::from_millis(1)).await;
        assert_eq!(controller.state(), CopyState::Success);
        assert_eq!(controller.displayed_label(), "Copied!");

        task.await.unwrap();
        assert_eq!(controller.state(), CopyState::Idle);
        let elapsed = settled_at.elapsed();
        assert!(elapsed >= RESET_DELAY);
        assert!(elapsed < RESET_DELAY + Duration::from_millis(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reactivation_during_success_window_keeps_new_attempt() {
        let gate = Arc::new(Semaphore::new(1));
        let source = Arc::new(FakeSource::ok("# Hello").gated(gate.clone()));
        let clipboard = Arc::new(FakeClipboard::default());
        let controller = controller(source.clone(), clipboard);
        let mut rx = watch_states(&controller);

        controller.activate_copy();
        rx.wait_for(|s| *s == CopyState::Success).await.unwrap();

        // Second attempt starts while the first one's reset is pending and
        // stays blocked on the gate past that reset.
        tokio::time::sleep(Duration::from_millis(500)).await;
        controller.activate_copy();
        assert_eq!(controller.state(), CopyState::Loading);

        tokio::time::sleep(RESET_DELAY).await;
        assert_eq!(controller.state(), CopyState::Loading);

        gate.add_permits(1);
        rx.wait_for(|s| *s == CopyState::Success).await.unwrap();
        rx.wait_for(|s| *s == CopyState::Idle).await.unwrap();
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_controller_usable_after_failure() {
        let source = Arc::new(FakeSource::status(StatusCode::INTERNAL_SERVER_ERROR));
        let clipboard = Arc::new(FakeClipboard::default());
        let controller = controller(source.clone(), clipboard);

        assert!(matches!(controller.run_copy().await, CopyOutcome::Failed(_)));
        assert!(matches!(controller.run_copy().await, CopyOutcome::Failed(_)));
        assert_eq!(source.calls(), 2);
        assert_eq!(controller.state(), CopyState::Idle);
    }

    #[tokio::test]
    async fn test_instances_do_not_share_state() {
        let gate = Arc::new(Semaphore::new(0));
        let first = controller(
            Arc::new(FakeSource::ok("a").gated(gate)),
            Arc::new(FakeClipboard::default()),
        );
        let second = controller(
            Arc::new(FakeSource::ok("b")),
            Arc::new(FakeClipboard::default()),
        );

        first.activate_copy();
        assert_eq!(first.state(), CopyState::Loading);
        assert_eq!(second.state(), CopyState::Idle);
        assert_eq!(second.displayed_label(), "Copy for LLM");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_logged_with_url() {
        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let source = Arc::new(FakeSource::status(StatusCode::NOT_FOUND));
        let controller = controller(source, Arc::new(FakeClipboard::default()));

        assert!(matches!(controller.run_copy().await, CopyOutcome::Failed(_)));

        let output = logs.contents();
        assert!(output.contains("ERROR"), "{output}");
        assert!(output.contains("Copy failed"), "{output}");
        assert!(output.contains("https://example.com/hello.md"), "{output}");
        assert!(output.contains("404"), "{output}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_resets_exactly_after_delay() {
        let source = Arc::new(FakeSource::status(StatusCode::NOT_FOUND));
        let controller = controller(source, Arc::new(FakeClipboard::default()));
        let mut rx = watch_states(&controller);

        let task = tokio::spawn({
            let controller = controller.clone();
            async move { controller.run_copy().await }
        });

        rx.wait_for(|s| *s == CopyState::Error).await.unwrap();
        let settled_at = Instant::now();

        tokio::time::sleep(RESET_DELAY - Duration::from_millis(1)).await;
        assert_eq!(controller.state(), CopyState::Error);
        assert_eq!(controller.displayed_label(), "Failed");

        rx.wait_for(|s| *s == CopyState::Idle).await.unwrap();
        let elapsed = settled_at.elapsed();
        assert!(elapsed >= RESET_DELAY);
        assert!(elapsed < RESET_DELAY + Duration::from_millis(5));

        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_transitions_are_never_coalesced() {
        let source = Arc::new(FakeSource::ok("# Hello"));
        let controller = controller(source, Arc::new(FakeClipboard::default()));
        let mut transitions = controller.transitions();

        controller.run_copy().await;

        let mut seen = Vec::new();
        while let Ok(state) = transitions.try_recv() {
            seen.push(state);
        }
        assert_eq!(
            seen,
            vec![CopyState::Loading, CopyState::Success, CopyState::Idle]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_skipped_activation_publishes_nothing() {
        let gate = Arc::new(Semaphore::new(0));
        let source = Arc::new(FakeSource::ok("# Hello").gated(gate.clone()));
        let controller = controller(source, Arc::new(FakeClipboard::default()));

        controller.activate_copy();
        let mut transitions = controller.transitions();
        assert!(matches!(controller.run_copy().await, CopyOutcome::Skipped));
        assert!(transitions.try_recv().is_err());

        gate.add_permits(1);
        assert_eq!(transitions.recv().await.unwrap(), CopyState::Success);
        assert_eq!(transitions.recv().await.unwrap(), CopyState::Idle);
    }
}
