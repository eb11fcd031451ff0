//! # Terminal State
//!
//! Everything one terminal instance knows, in one place.
//!
//! ```text
//! TerminalState
//! ├── mode: Mode                // which transport shape is active
//! ├── log: OutputLog            // the transcript
//! ├── editor: InputEditor       // lines being typed + echo cursor
//! ├── framer: LineFramer        // socket text carried across frames
//! └── session: SessionState     // as last reported by the transport
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::core::editor::{InputEditor, prompt_for};
use crate::core::framer::LineFramer;
use crate::core::output::{OutputLog, OutputRecord};
use crate::transport::SessionState;

/// Prompt for the first logical line outside socket mode.
pub const DEFAULT_PROMPT: &str = "$";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Local console. Commands go to a handler when one is registered.
    #[default]
    Standard,
    /// Commands go to the host's async handler.
    Controlled,
    /// Commands go over a WebSocket; the remote supplies the prompt.
    #[serde(alias = "websocket")]
    #[value(alias = "websocket")]
    Socket,
    /// Each command opens a server-sent events stream.
    EventStream,
}

impl Mode {
    /// Name used in connection status records.
    pub fn label(self) -> &'static str {
        match self {
            Mode::Socket => "WebSocket",
            Mode::EventStream => "Event stream",
            Mode::Standard | Mode::Controlled => "Callback",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TerminalState {
    pub mode: Mode,
    pub log: OutputLog,
    pub editor: InputEditor,
    pub framer: LineFramer,
    pub session: SessionState,
}

impl TerminalState {
    pub fn new(mode: Mode, initial_content: &str) -> Self {
        let mut log = OutputLog::new();
        if !initial_content.is_empty() {
            log.append(OutputRecord::plain(initial_content));
        }
        Self {
            mode,
            log,
            editor: InputEditor::new(),
            framer: LineFramer::new(),
            session: SessionState::Idle,
        }
    }

    /// Prompt for the first logical line: the remote's pending fragment in
    /// socket mode, `$` everywhere else.
    pub fn first_prompt(&self) -> String {
        match self.mode {
            Mode::Socket => self.framer.pending().to_string(),
            _ => DEFAULT_PROMPT.to_string(),
        }
    }

    /// Prompt shown before the line currently being edited.
    pub fn prompt(&self) -> String {
        let first = self.first_prompt();
        prompt_for(self.editor.active_index(), &first).to_string()
    }

    /// Drops the remote prompt once an echo has used it, so the reply that
    /// follows is not joined onto it. No-op outside socket mode.
    pub fn consume_prompt(&mut self) {
        if self.mode == Mode::Socket {
            self.framer.reset();
        }
    }

    /// True once the session has closed; inbound events are ignored until a
    /// new stream starts.
    pub fn is_closed(&self) -> bool {
        self.session.is_finished()
    }

    /// The `clear` built-in: empty transcript, fresh input.
    pub fn clear(&mut self) {
        self.log.clear();
        self.editor.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_seeds_initial_content() {
        let state = TerminalState::new(Mode::Standard, "Welcome!");
        assert_eq!(state.log.records(), &[OutputRecord::plain("Welcome!")]);

        let empty = TerminalState::new(Mode::Standard, "");
        assert!(empty.log.is_empty());
    }

    #[test]
    fn test_prompt_by_mode_and_line() {
        let mut state = TerminalState::new(Mode::Controlled, "");
        assert_eq!(state.prompt(), "$");

        state.editor.insert_char('\\');
        let mut log = OutputLog::new();
        let first = state.first_prompt();
        state.editor.submit(&first, &mut log);
        assert_eq!(state.prompt(), ">");
    }

    #[test]
    fn test_socket_prompt_comes_from_framer() {
        let mut state = TerminalState::new(Mode::Socket, "");
        assert_eq!(state.prompt(), "");
        state.framer.push("motd\nhost# ");
        assert_eq!(state.prompt(), "host# ");

        state.consume_prompt();
        assert_eq!(state.prompt(), "");
    }

    #[test]
    fn test_mode_parses_kebab_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: Mode,
        }
        let w: Wrapper = toml::from_str("mode = \"event-stream\"").unwrap();
        assert_eq!(w.mode, Mode::EventStream);
        assert_eq!(Mode::from_str("socket", true), Ok(Mode::Socket));
    }
}
