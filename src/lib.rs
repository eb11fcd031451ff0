//! Termline library exports for the binary and integration tests

pub mod core;
pub mod transport;
pub mod tui;
pub mod widget;

#[cfg(test)]
pub mod test_support;

pub use widget::TerminalWidget;
