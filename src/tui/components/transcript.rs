//! # Transcript Component
//!
//! Renders the output log followed by the line being edited, the way a real
//! terminal shows it: records (continued lines are already among them), then
//! `prompt + active line` with the cursor at its end.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ Welcome!                     │  plain record
//! │ $ ls                         │  echoed command
//! │ a.txt  b.txt                 │  output
//! │ $ echo one \                 │  continued line, echoed on Enter
//! │ > two█                       │  active line + cursor
//! └──────────────────────────────┘
//! ```
//!
//! Records are word-wrapped with textwrap. Input rows are hard-wrapped by
//! display width instead, because textwrap drops trailing spaces and the
//! cursor has to sit after them.

use crate::core::output::OutputRecord;
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;
use crate::tui::theme::Palette;

use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Scroll and cursor state, kept across frames.
pub struct TranscriptState {
    pub scroll_state: ScrollViewState,
    /// Follow new output. Cleared by scrolling up, restored by End.
    pub stick_to_bottom: bool,
    pub has_unseen_content: bool,
    /// Screen position of the cursor after the last render.
    pub cursor: Option<Position>,
}

impl Default for TranscriptState {
    fn default() -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            stick_to_bottom: true,
            has_unseen_content: false,
            cursor: None,
        }
    }
}

impl EventHandler for TranscriptState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<()> {
        match event {
            TuiEvent::ScrollUp => {
                self.stick_to_bottom = false;
                self.scroll_state.scroll_up();
            }
            TuiEvent::ScrollDown => self.scroll_state.scroll_down(),
            TuiEvent::ScrollPageUp => {
                self.stick_to_bottom = false;
                self.scroll_state.scroll_page_up();
            }
            TuiEvent::ScrollPageDown => self.scroll_state.scroll_page_down(),
            TuiEvent::ScrollToBottom => self.stick_to_bottom = true,
            _ => return None,
        }
        Some(())
    }
}

pub struct Transcript<'a> {
    pub records: &'a [OutputRecord],
    /// `prompt + active line`.
    pub active: String,
    pub palette: Palette,
    pub state: &'a mut TranscriptState,
}

impl Component for Transcript<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        // One column for the scrollbar.
        let content_width = area.width.saturating_sub(1).max(1);
        let width = content_width as usize;

        let mut lines: Vec<Line> = Vec::new();
        for record in self.records {
            let style = if record.prefix.is_some() {
                self.palette.echo
            } else {
                self.palette.output
            };
            for row in record_rows(record, width) {
                lines.push(Line::styled(row, style));
            }
        }
        let active_rows = hard_wrap(&self.active, width);
        let last_width = active_rows.last().map(|r| r.width()).unwrap_or(0);
        for row in active_rows {
            lines.push(Line::styled(row, self.palette.input));
        }

        // Cursor past the right edge wraps onto a fresh row.
        let (cursor_row, cursor_col) = if last_width >= width {
            lines.push(Line::styled(String::new(), self.palette.input));
            (lines.len() - 1, 0)
        } else {
            (lines.len() - 1, last_width)
        };

        let canvas_height = lines.len() as u16;
        let mut scroll_view = ScrollView::new(Size::new(content_width, canvas_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Automatic)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);
        scroll_view.render_widget(
            Paragraph::new(lines).style(self.palette.background),
            Rect::new(0, 0, content_width, canvas_height),
        );

        if self.state.stick_to_bottom {
            self.state.scroll_state.scroll_to_bottom();
        }
        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);

        let offset = self.state.scroll_state.offset().y;
        let max_scroll = canvas_height.saturating_sub(area.height);
        self.state.has_unseen_content = canvas_height > area.height && offset < max_scroll;
        if offset >= max_scroll {
            self.state.stick_to_bottom = true;
        }

        let row = cursor_row as u16;
        self.state.cursor = (row >= offset && row - offset < area.height).then(|| Position {
            x: area.x + cursor_col as u16,
            y: area.y + row - offset,
        });
    }
}

/// Word-wrapped rows for one record; embedded newlines start new rows.
pub fn record_rows(record: &OutputRecord, width: usize) -> Vec<String> {
    let text = record.to_string();
    let options = textwrap::Options::new(width.max(1)).break_words(true);
    text.split('\n')
        .flat_map(|logical| {
            textwrap::wrap(logical, &options)
                .into_iter()
                .map(|row| row.into_owned())
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Splits by display width, keeping every character (trailing spaces too).
/// Always returns at least one row.
pub fn hard_wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = vec![String::new()];
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width && used > 0 {
            rows.push(String::new());
            used = 0;
        }
        if let Some(row) = rows.last_mut() {
            row.push(c);
        }
        used += w;
    }
    rows
}
