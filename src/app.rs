//! Main application state and event loop.

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::Config;
use crate::models::Page;
use crate::screens::{PagesScreen, Screen, ScreenAction};
use crate::services::{HttpMarkdownSource, SystemClipboard};

/// Application state.
pub struct App {
    should_quit: bool,
    pages_screen: PagesScreen,

    // Status bar info
    status_message: String,
}

impl App {
    /// Create a new application instance.
    pub fn new(config: &Config, pages: Vec<Page>) -> Result<Self> {
        let source = Arc::new(HttpMarkdownSource::new()?);
        let clipboard = Arc::new(SystemClipboard::new()?);

        let pages_screen = PagesScreen::new(pages, config, source, clipboard);
        let status_message = format!("{} pages", pages_screen.page_count());

        Ok(Self {
            should_quit: false,
            pages_screen,
            status_message,
        })
    }

    /// Run the application.
    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        info!(pages = self.pages_screen.page_count(), "starting TUI");

        // Main event loop
        let result = self.event_loop(&mut terminal).await;

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    /// Main event loop.
    ///
    /// Copies run on background tasks, so the loop redraws on every poll
    /// timeout to pick up their state changes.
    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;

            // crossterm's poll blocks the thread; keep it off the runtime
            // workers that drive the copy tasks.
            let ready = tokio::task::block_in_place(|| event::poll(Duration::from_millis(100)))?;
            if ready {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    match (key.modifiers, key.code) {
                        (KeyModifiers::CONTROL, KeyCode::Char('c'))
                        | (KeyModifiers::CONTROL, KeyCode::Char('q')) => {
                            self.should_quit = true;
                        }
                        (_, KeyCode::Char('q')) | (_, KeyCode::Esc) => {
                            self.should_quit = true;
                        }
                        _ => {
                            if let ScreenAction::StatusMessage(msg) =
                                self.pages_screen.handle_key(key).await
                            {
                                self.status_message = msg;
                            }
                        }
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Draw the UI.
    fn draw(&mut self, f: &mut ratatui::Frame) {
        use ratatui::layout::{Constraint, Direction, Layout};
        use ratatui::style::{Color, Style};
        use ratatui::text::{Line, Span};
        use ratatui::widgets::Paragraph;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),    // Main content
                Constraint::Length(1), // Status bar
            ])
            .split(f.area());

        self.pages_screen.draw(f, chunks[0]);

        let hint = |key: &'static str, what: &'static str| {
            [
                Span::raw(" │ "),
                Span::styled(key, Style::default().fg(Color::DarkGray)),
                Span::styled(what, Style::default().fg(Color::Gray)),
            ]
        };

        let mut spans = vec![
            Span::raw(" "),
            Span::styled(self.status_message.as_str(), Style::default().fg(Color::Gray)),
        ];
        spans.extend(hint("j/k", " Nav"));
        spans.extend(hint("Tab", " Button"));
        spans.extend(hint("c", " Copy"));
        spans.extend(hint("v", " View"));
        spans.extend(hint("q", " Quit"));

        f.render_widget(Paragraph::new(Line::from(spans)), chunks[1]);
    }
}
