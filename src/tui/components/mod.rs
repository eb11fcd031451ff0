//! # TUI Components
//!
//! - `TitleBar`: stateless status line (mode, session state, playback)
//! - `Transcript`: scrollable output log plus the line being edited
//!
//! Components get their data as props and keep presentation state
//! (scroll offset, cursor) in a separate `*State` owned by the TUI loop.

mod title_bar;
pub use title_bar::TitleBar;

pub mod transcript;
pub use transcript::{Transcript, TranscriptState};
