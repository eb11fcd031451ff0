//! # Transports
//!
//! One capability, three shapes of remote:
//!
//! ```text
//!                 ┌──────────────────────────┐
//!   send(cmd) ──▶ │   dyn Transport          │ ──▶ TransportEvent channel
//!                 ├────────┬────────┬────────┤      (Opened, Text, Record,
//!                 │ socket │  SSE   │callback│       Connecting, Closed)
//!                 └────────┴────────┴────────┘
//! ```
//!
//! A transport owns its session and pushes everything it receives into an
//! unbounded channel that the widget drains on its event loop. Exactly one
//! transport is selected per mode; they are never mixed.

pub mod callback;
pub mod event_stream;
pub mod socket;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

pub use callback::{CallbackTransport, CommandHandler, command_handler, shell_handler};
pub use event_stream::{EventStreamConfig, EventStreamTransport, StreamMethod};
pub use socket::SocketTransport;

use crate::core::config::ResolvedConfig;
use crate::core::state::Mode;

/// Lifecycle of the single session a widget owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Connecting,
    Open,
    /// Open and at least one inbound payload has arrived.
    Streaming,
    Closed,
    Errored,
}

impl SessionState {
    pub fn is_open(self) -> bool {
        matches!(self, SessionState::Open | SessionState::Streaming)
    }

    pub fn is_finished(self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Errored)
    }
}

/// Everything a transport can report back to the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A new stream is being opened (event-stream: one per command).
    Connecting,
    Opened,
    /// Raw socket text, still to be framed into lines.
    Text(String),
    /// One complete transcript line with no prefix.
    Record(String),
    /// The session ended. `reason` is set when it ended because of an error.
    Closed { reason: Option<String> },
}

pub type EventSender = UnboundedSender<TransportEvent>;

/// Errors a transport can hit. None of them reach the user as a failure:
/// the dispatcher logs them and the transcript shows a closed record.
#[derive(Debug)]
pub enum TransportError {
    /// Nothing can carry the command right now (session not open). Dropped silently.
    Unavailable(String),
    /// Connect, read or write failed.
    Connection(String),
    /// The HTTP endpoint answered with a non-success status.
    Http { status: u16, message: String },
    /// The widget stopped listening for events.
    Closed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Unavailable(msg) => write!(f, "transport unavailable: {msg}"),
            TransportError::Connection(msg) => write!(f, "connection error: {msg}"),
            TransportError::Http { status, message } => {
                write!(f, "HTTP {status}: {message}")
            }
            TransportError::Closed => write!(f, "event channel closed"),
        }
    }
}

impl std::error::Error for TransportError {}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Short label used in transcript status lines and logs.
    fn name(&self) -> &str;

    fn state(&self) -> SessionState;

    /// Sends one complete command. Results arrive later as events.
    async fn send(&self, command: &str) -> Result<(), TransportError>;

    /// Ends the session. Emits exactly one `Closed` event unless the
    /// session already ended.
    fn close(&self);
}

/// Pushes an event, mapping a dropped receiver to `TransportError::Closed`.
pub(crate) fn emit(events: &EventSender, event: TransportEvent) -> Result<(), TransportError> {
    events.send(event).map_err(|_| TransportError::Closed)
}

/// Builds the transport for the configured mode.
///
/// Standard mode has no remote: only built-ins do anything there. Controlled
/// mode needs a handler; `None` leaves commands undeliverable.
pub fn connect(
    config: &ResolvedConfig,
    events: EventSender,
    handler: Option<CommandHandler>,
) -> Option<Arc<dyn Transport>> {
    match config.mode {
        Mode::Socket => Some(Arc::new(SocketTransport::connect(
            config.socket_url.clone(),
            config.websocket_delay,
            events,
        ))),
        Mode::EventStream => Some(Arc::new(EventStreamTransport::new(
            config.event_stream.clone(),
            events,
        ))),
        Mode::Controlled | Mode::Standard => handler
            .map(|handler| Arc::new(CallbackTransport::new(handler, events)) as Arc<dyn Transport>),
    }
}
