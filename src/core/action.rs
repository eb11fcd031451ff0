//! # Actions
//!
//! Everything that can happen to a terminal becomes an `Action`.
//! User presses Enter? That's `Action::Submit`.
//! Socket delivers text? That's `Action::Transport(TransportEvent::Text(..))`.
//!
//! `update()` applies an action to the state and returns the one `Effect`
//! the caller has to carry out (send a command, notify an observer). No I/O
//! happens here.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```

use log::{debug, info};

use crate::core::dispatch::{Builtin, Route, route};
use crate::core::output::OutputRecord;
use crate::core::state::{Mode, TerminalState};
use crate::transport::{SessionState, TransportEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // Live editing
    InsertChar(char),
    Backspace,
    SetInput(String),
    Submit,

    // Scripted playback
    /// Append one typed character to the active line (no continuation logic).
    TypeChar(char),
    /// Echo a scripted command together with its canned result.
    EchoCanned { command: String, result: String },
    /// Run a scripted command through the same path as a live submit.
    Execute(String),
    ClearInput,

    Transport(TransportEvent),
}

/// Side effect requested by `update()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    Dispatch(String),
    /// The session opened: run `on_connect` observers.
    Connected,
    /// The session closed: run `on_close` observers.
    Disconnected,
}

pub fn update(state: &mut TerminalState, action: Action) -> Effect {
    match action {
        Action::InsertChar(c) | Action::TypeChar(c) => {
            state.editor.insert_char(c);
            Effect::None
        }
        Action::Backspace => {
            state.editor.backspace();
            Effect::None
        }
        Action::SetInput(text) => {
            state.editor.set_active_line(text);
            Effect::None
        }
        Action::ClearInput => {
            state.editor.set_active_line(String::new());
            Effect::None
        }
        Action::Submit => {
            let first_prompt = state.first_prompt();
            let before = state.log.len();
            let submitted = state.editor.submit(&first_prompt, &mut state.log);
            if state.log.len() > before {
                state.consume_prompt();
            }
            match submitted {
                Some(command) => run_command(state, command),
                None => Effect::None,
            }
        }
        Action::EchoCanned { command, result } => {
            let prompt = state.prompt();
            state.log.append(OutputRecord::prefixed(prompt, command));
            state.consume_prompt();
            state.log.append(OutputRecord::plain(result));
            Effect::None
        }
        Action::Execute(command) => {
            if matches!(route(&command), Route::Builtin(_)) {
                return run_command(state, command);
            }
            let prompt = state.prompt();
            state.log.append(OutputRecord::prefixed(prompt, command.as_str()));
            state.consume_prompt();
            run_command(state, command)
        }
        Action::Transport(event) => apply_transport_event(state, event),
    }
}

fn run_command(state: &mut TerminalState, command: String) -> Effect {
    match route(&command) {
        Route::Builtin(Builtin::Clear) => {
            debug!("built-in: clear");
            state.clear();
            Effect::None
        }
        Route::Forward => Effect::Dispatch(command),
    }
}

fn apply_transport_event(state: &mut TerminalState, event: TransportEvent) -> Effect {
    match event {
        TransportEvent::Connecting => {
            state.session = SessionState::Connecting;
            Effect::None
        }
        _ if state.is_closed() => {
            debug!("ignoring {:?} after session close", event);
            Effect::None
        }
        TransportEvent::Opened => {
            state.session = SessionState::Open;
            if state.mode == Mode::Socket {
                state.log.append(OutputRecord::plain(format!(
                    "{} connection established.",
                    state.mode.label()
                )));
            }
            Effect::Connected
        }
        TransportEvent::Text(chunk) => {
            state.session = SessionState::Streaming;
            for line in state.framer.push(&chunk) {
                state.log.append(OutputRecord::plain(line));
            }
            Effect::None
        }
        TransportEvent::Record(line) => {
            state.session = SessionState::Streaming;
            state.log.append(OutputRecord::plain(line));
            Effect::None
        }
        TransportEvent::Closed { reason } => {
            if let Some(fragment) = state.framer.finish() {
                state.log.append(OutputRecord::plain(fragment));
            }
            let label = state.mode.label();
            let record = match &reason {
                Some(reason) => format!("{label} connection closed ({reason})."),
                None => format!("{label} connection closed."),
            };
            state.log.append(OutputRecord::plain(record));
            state.session = if reason.is_some() {
                SessionState::Errored
            } else {
                SessionState::Closed
            };
            info!("{} session ended: {:?}", label, state.session);
            Effect::Disconnected
        }
    }
}
