//! Pages screen - one row per page with its copy and view buttons.

use anyhow::Result;
use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use ratatui_garnish::{shadow::HalfShadow, GarnishableWidget};
use std::sync::Arc;

use crate::config::Config;
use crate::models::{ButtonAttributes, CopyContext, CopyState, Page};
use crate::services::{open_markdown, ClipboardSink, CopyController, MarkdownSource};

use super::{Screen, ScreenAction};

const ROW_HEIGHT: u16 = 3;
const COPY_ICON: &str = "⧉";
/// Stands in for the copy icon while a fetch is in flight.
const BUSY_ICON: &str = "…";
const VIEW_ICON: &str = "▤";

/// Which button in the selected row has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Copy,
    View,
}

/// A page and the two buttons rendered for it.
struct PageRow {
    page: Page,
    copy: CopyController,
    md_url: String,
}

/// Screen listing pages with "Copy for LLM" and "View as Markdown" buttons.
pub struct PagesScreen {
    rows: Vec<PageRow>,
    copy_attributes: ButtonAttributes,
    view_attributes: ButtonAttributes,
    open_url: fn(&str) -> Result<()>,

    // UI state
    selected: usize,
    focus: Focus,
    offset: usize,
}

impl PagesScreen {
    /// Create a screen with one copy controller per page.
    pub fn new(
        pages: Vec<Page>,
        config: &Config,
        source: Arc<dyn MarkdownSource>,
        clipboard: Arc<dyn ClipboardSink>,
    ) -> Self {
        let labels = config.copy_button.labels();
        let rows = pages
            .into_iter()
            .map(|page| {
                let md_url = page.markdown_url();
                let context = CopyContext::new(md_url.clone(), labels.clone());
                PageRow {
                    copy: CopyController::new(context, source.clone(), clipboard.clone()),
                    page,
                    md_url,
                }
            })
            .collect();

        Self {
            rows,
            copy_attributes: config.copy_button.attributes(),
            view_attributes: config.view_button.attributes(),
            open_url: open_markdown,
            selected: 0,
            focus: Focus::Copy,
            offset: 0,
        }
    }

    pub fn page_count(&self) -> usize {
        self.rows.len()
    }

    fn selected_row(&self) -> Option<&PageRow> {
        self.rows.get(self.selected)
    }

    fn move_up(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        self.selected = if self.selected == 0 {
            self.rows.len() - 1
        } else {
            self.selected - 1
        };
    }

    fn move_down(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        self.selected = if self.selected + 1 >= self.rows.len() {
            0
        } else {
            self.selected + 1
        };
    }

    fn switch_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Copy => Focus::View,
            Focus::View => Focus::Copy,
        };
    }

    fn activate_copy(&self) -> ScreenAction {
        let Some(row) = self.selected_row() else {
            return ScreenAction::None;
        };

        if row.copy.is_disabled() {
            return ScreenAction::StatusMessage("Copy already in progress".to_string());
        }

        row.copy.activate_copy();
        ScreenAction::StatusMessage(format!("Copying {}", row.md_url))
    }

    fn activate_view(&self) -> ScreenAction {
        let Some(row) = self.selected_row() else {
            return ScreenAction::None;
        };

        match (self.open_url)(&row.md_url) {
            Ok(()) => ScreenAction::StatusMessage(format!("Opened {}", row.md_url)),
            Err(e) => ScreenAction::StatusMessage(format!("{:#}", e)),
        }
    }

    /// Keep the selected row inside the visible window.
    fn scroll_to_selected(&mut self, visible_rows: usize) {
        let visible_rows = visible_rows.max(1);
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + visible_rows {
            self.offset = self.selected + 1 - visible_rows;
        }
    }

    fn draw_row(&self, f: &mut Frame, area: Rect, index: usize) {
        let row = &self.rows[index];
        let is_selected = index == self.selected;

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(area);

        let title_style = if is_selected {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let title = Paragraph::new(vec![
            Line::from(Span::styled(&row.page.display_name, title_style)),
            Line::from(Span::styled(
                &row.page.permalink,
                Style::default().fg(Color::DarkGray),
            )),
        ]);
        f.render_widget(title, columns[0]);

        let slots = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(columns[1]);

        let state = row.copy.state();
        let copy_label = row.copy.displayed_label();
        let copy_icon = if row.copy.is_loading() { BUSY_ICON } else { COPY_ICON };
        let copy_focused = is_selected && self.focus == Focus::Copy;
        let copy_style = copy_button_style(state);
        let copy_area = button_area(slots[0], &self.copy_attributes);
        render_button(
            f,
            copy_area,
            button_text(copy_icon, copy_label, &self.copy_attributes),
            copy_style,
            copy_focused,
        );

        let view_focused = is_selected && self.focus == Focus::View;
        let view_area = button_area(slots[1], &self.view_attributes);
        render_button(
            f,
            view_area,
            button_text(VIEW_ICON, &self.view_attributes.label, &self.view_attributes),
            Style::default().fg(Color::White),
            view_focused,
        );
    }
}

/// Style for the copy button in `state`. Dimmed while disabled.
fn copy_button_style(state: CopyState) -> Style {
    match state {
        CopyState::Idle => Style::default().fg(Color::White),
        CopyState::Loading => Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM),
        CopyState::Success => Style::default().fg(Color::Green),
        CopyState::Error => Style::default().fg(Color::Red),
    }
}

/// Button text with the optional leading icon.
fn button_text(icon: &str, label: &str, attributes: &ButtonAttributes) -> String {
    if attributes.show_icon {
        format!("{} {}", icon, label)
    } else {
        label.to_string()
    }
}

/// Shrink `slot` to the configured button width, anchored left.
fn button_area(slot: Rect, attributes: &ButtonAttributes) -> Rect {
    match attributes.width {
        Some(width) => Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(width.percent()), Constraint::Min(0)])
            .split(slot)[0],
        None => slot,
    }
}

fn render_button(f: &mut Frame, area: Rect, text: String, style: Style, focused: bool) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        });
    let button = Paragraph::new(Line::from(Span::styled(text, style)))
        .block(block)
        .alignment(ratatui::layout::Alignment::Center);

    if focused {
        f.render_widget(button.garnish(HalfShadow::default()), area);
    } else {
        f.render_widget(button, area);
    }
}

#[async_trait]
impl Screen for PagesScreen {
    fn draw(&mut self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Pages ({})", self.rows.len()));
        let inner = block.inner(area);
        f.render_widget(block, area);

        if self.rows.is_empty() {
            let empty = Paragraph::new(
                "No pages configured\n\nPass permalinks on the command line or add `pages` to the config file",
            )
            .style(Style::default().fg(Color::Gray));
            f.render_widget(empty, inner);
            return;
        }

        let visible_rows = usize::from(inner.height / ROW_HEIGHT);
        self.scroll_to_selected(visible_rows);

        let end = (self.offset + visible_rows.max(1)).min(self.rows.len());
        for (slot, index) in (self.offset..end).enumerate() {
            let y = inner.y + slot as u16 * ROW_HEIGHT;
            if y + ROW_HEIGHT > inner.y + inner.height {
                break;
            }
            let row_area = Rect::new(inner.x, y, inner.width, ROW_HEIGHT);
            self.draw_row(f, row_area, index);
        }
    }

    async fn handle_key(&mut self, key: KeyEvent) -> ScreenAction {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_up();
                ScreenAction::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_down();
                ScreenAction::None
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.focus = Focus::Copy;
                ScreenAction::None
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.focus = Focus::View;
                ScreenAction::None
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.switch_focus();
                ScreenAction::None
            }
            KeyCode::Enter | KeyCode::Char(' ') => match self.focus {
                Focus::Copy => self.activate_copy(),
                Focus::View => self.activate_view(),
            },
            KeyCode::Char('c') | KeyCode::Char('y') => self.activate_copy(),
            KeyCode::Char('v') | KeyCode::Char('o') => self.activate_view(),
            _ => ScreenAction::None,
        }
    }
}
