//! # Core Terminal Logic
//!
//! Everything a terminal instance does that is not I/O: line framing, the
//! transcript, multi-line editing, command routing and scripted playback.
//! It knows nothing about ratatui or about how bytes reach a remote.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • TerminalState        │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    └───────────┬─────────────┘
//!                                │ Effect
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │    TUI     │      │   Widget   │      │ Transports │
//!     │ (ratatui)  │      │  runtime   │      │ (tokio)    │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`framer`]: `LineFramer`, reassembles lines from arbitrary chunks
//! - [`output`]: `OutputLog`, the ordered transcript
//! - [`editor`]: `InputEditor`, multi-line input with `\` continuation
//! - [`state`]: `TerminalState` and `Mode`
//! - [`action`]: `Action`, `Effect` and the `update()` reducer
//! - [`dispatch`]: built-in routing and `CommandDispatcher`
//! - [`playback`]: `PlaybackController` for scripted sessions
//! - [`config`]: layered configuration

pub mod action;
pub mod config;
pub mod dispatch;
pub mod editor;
pub mod framer;
pub mod output;
pub mod playback;
pub mod state;
