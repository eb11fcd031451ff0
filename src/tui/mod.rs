//! # TUI Adapter
//!
//! The ratatui-specific layer. Hosts one `TerminalWidget`, renders its
//! transcript, and translates keyboard events into core `Action`s.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Redraw Strategy
//!
//! Output can arrive from the transport at any time, so the loop wakes at a
//! fixed short interval, drains whatever the widget has queued and redraws
//! only when something was applied or a key was pressed. While a script is
//! playing the interval drops so typed characters appear smoothly.
//!
//! A `SteadyBlock` cursor is used because `set_cursor_position` resets the
//! blink timer on every `draw()`.

mod component;
mod components;
mod event;
mod theme;
mod ui;

pub use theme::Palette;

use log::{debug, info};
use std::io::stdout;
use std::time::Duration;

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;

use crate::core::action::Action;
use crate::core::config::{ResolvedConfig, Theme};
use crate::core::playback::PlaybackController;
use crate::transport::CommandHandler;
use crate::tui::component::EventHandler;
use crate::tui::components::TranscriptState;
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};
use crate::widget::TerminalWidget;

const IDLE_POLL: Duration = Duration::from_millis(50);
const PLAYBACK_POLL: Duration = Duration::from_millis(16);

/// TUI-specific presentation state (not part of the terminal's core state)
pub struct TuiState {
    pub transcript: TranscriptState,
    pub palette: Palette,
}

impl TuiState {
    pub fn new(theme: Theme) -> Self {
        Self {
            transcript: TranscriptState::default(),
            palette: Palette::for_theme(theme),
        }
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, steady block cursor)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide
        );
    }
}

/// Runs the terminal until the user quits. Must be called from within a
/// multi-threaded tokio runtime: transports and dispatch run on its workers.
pub fn run(config: ResolvedConfig, handler: Option<CommandHandler>) -> std::io::Result<()> {
    let mut widget = TerminalWidget::from_config(&config, handler);
    widget.on_connect(|| info!("session connected"));
    widget.on_close(|| info!("session closed"));
    widget.start_playback(PlaybackController::new(
        config.script.clone(),
        config.typing_delay,
        config.command_delay,
    ));

    let mut tui = TuiState::new(config.theme);
    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    let result = event_loop(&mut terminal, &mut widget, &mut tui);

    widget.close();
    ratatui::restore();
    result
}

fn event_loop(
    terminal: &mut ratatui::DefaultTerminal,
    widget: &mut TerminalWidget,
    tui: &mut TuiState,
) -> std::io::Result<()> {
    let mut needs_redraw = true; // Force first frame

    loop {
        if widget.drain() > 0 {
            needs_redraw = true;
        }

        if needs_redraw {
            terminal.draw(|f| ui::draw_ui(f, widget, tui))?;
            needs_redraw = false;
        }

        let timeout = if widget.is_playing() {
            PLAYBACK_POLL
        } else {
            IDLE_POLL
        };
        let first_event = poll_event_timeout(timeout);
        if first_event.is_some() {
            needs_redraw = true;
        }

        // Process first event + drain ALL pending events before next draw
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            if apply_event(event, widget, tui) == LoopControl::Quit {
                info!("quit requested");
                return Ok(());
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum LoopControl {
    Continue,
    Quit,
}

fn apply_event(event: TuiEvent, widget: &mut TerminalWidget, tui: &mut TuiState) -> LoopControl {
    if tui.transcript.handle_event(&event).is_some() {
        return LoopControl::Continue;
    }

    match event {
        TuiEvent::ForceQuit | TuiEvent::Quit => return LoopControl::Quit,
        TuiEvent::Resize => {}
        TuiEvent::InputChar(c) => {
            tui.transcript.stick_to_bottom = true;
            widget.handle(Action::InsertChar(c));
        }
        TuiEvent::Backspace => widget.handle(Action::Backspace),
        TuiEvent::Submit => {
            tui.transcript.stick_to_bottom = true;
            widget.handle(Action::Submit);
        }
        TuiEvent::Paste(text) => {
            debug!("paste: {} byte(s)", text.len());
            tui.transcript.stick_to_bottom = true;
            for c in text.chars() {
                match c {
                    '\n' => widget.handle(Action::Submit),
                    '\r' => {}
                    c => widget.handle(Action::InsertChar(c)),
                }
            }
        }
        // Scroll events were consumed by the transcript above.
        _ => {}
    }
    LoopControl::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::Mode;

    #[tokio::test]
    async fn test_paste_submits_each_line() {
        let mut widget = TerminalWidget::new(Mode::Standard, "");
        let mut tui = TuiState::new(Theme::Standard);

        let control = apply_event(TuiEvent::Paste("pwd\r\nwho".to_string()), &mut widget, &mut tui);

        assert_eq!(control, LoopControl::Continue);
        assert_eq!(widget.records().len(), 1);
        assert_eq!(widget.records()[0].to_string(), "$ pwd");
        assert_eq!(widget.state().editor.active_line(), "who");
    }

    #[tokio::test]
    async fn test_typing_and_backspace() {
        let mut widget = TerminalWidget::new(Mode::Standard, "");
        let mut tui = TuiState::new(Theme::Standard);
        for event in [
            TuiEvent::InputChar('l'),
            TuiEvent::InputChar('x'),
            TuiEvent::Backspace,
            TuiEvent::InputChar('s'),
        ] {
            apply_event(event, &mut widget, &mut tui);
        }
        assert_eq!(widget.state().editor.active_line(), "ls");
    }

    #[tokio::test]
    async fn test_quit_and_scroll() {
        let mut widget = TerminalWidget::new(Mode::Standard, "");
        let mut tui = TuiState::new(Theme::Standard);

        assert_eq!(
            apply_event(TuiEvent::ScrollUp, &mut widget, &mut tui),
            LoopControl::Continue
        );
        assert!(!tui.transcript.stick_to_bottom);
        assert_eq!(
            apply_event(TuiEvent::ForceQuit, &mut widget, &mut tui),
            LoopControl::Quit
        );
    }
}
