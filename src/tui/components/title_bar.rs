//! # TitleBar Component
//!
//! One-line status bar: which transport is active, what state its session is
//! in, whether a script is playing, and a "↓ New" marker when output arrived
//! below the current scroll position.
//!
//! Purely presentational. All data comes in as props:
//!
//! ```rust,ignore
//! let mut title_bar = TitleBar::new(Mode::Socket, SessionState::Open, false, false);
//! title_bar.render(frame, area);
//! ```

use crate::core::state::Mode;
use crate::transport::SessionState;
use crate::tui::component::Component;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Span;

pub struct TitleBar {
    pub mode: Mode,
    pub session: SessionState,
    pub playing: bool,
    pub has_unseen_content: bool,
    pub style: Style,
}

impl TitleBar {
    pub fn new(mode: Mode, session: SessionState, playing: bool, has_unseen_content: bool) -> Self {
        Self {
            mode,
            session,
            playing,
            has_unseen_content,
            style: Style::default(),
        }
    }

    pub fn text(&self) -> String {
        let mut text = format!("Termline | {} | {}", self.mode.label(), session_label(self.session));
        if self.playing {
            text.push_str(" | ▶ playback");
        }
        if self.has_unseen_content {
            text.push_str(" | ↓ New");
        }
        text
    }
}

fn session_label(session: SessionState) -> &'static str {
    match session {
        SessionState::Idle => "idle",
        SessionState::Connecting => "connecting…",
        SessionState::Open => "open",
        SessionState::Streaming => "streaming",
        SessionState::Closed => "closed",
        SessionState::Errored => "error",
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        // Pad so the style covers the full width.
        let text = format!("{:<width$}", self.text(), width = area.width as usize);
        frame.render_widget(Span::styled(text, self.style), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn rendered(mut title_bar: TitleBar) -> String {
        let backend = TestBackend::new(80, 1);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| {
                title_bar.render(f, f.area());
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    #[test]
    fn test_title_bar_shows_mode_and_session() {
        let text = rendered(TitleBar::new(Mode::Socket, SessionState::Open, false, false));
        assert!(text.contains("Termline"));
        assert!(text.contains("WebSocket"));
        assert!(text.contains("open"));
        assert!(!text.contains("playback"));
        assert!(!text.contains("↓ New"));
    }

    #[test]
    fn test_title_bar_playback_and_unseen() {
        let text = rendered(TitleBar::new(
            Mode::EventStream,
            SessionState::Streaming,
            true,
            true,
        ));
        assert!(text.contains("Event stream"));
        assert!(text.contains("streaming"));
        assert!(text.contains("▶ playback"));
        assert!(text.contains("↓ New"));
    }

    #[test]
    fn test_session_labels() {
        assert_eq!(session_label(SessionState::Errored), "error");
        assert_eq!(session_label(SessionState::Closed), "closed");
    }
}
