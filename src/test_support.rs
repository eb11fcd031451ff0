//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::Mutex;

use async_trait::async_trait;

use crate::transport::{SessionState, Transport, TransportError};

/// A transport that remembers what it was asked to send.
pub struct RecordingTransport {
    sent: Mutex<Vec<String>>,
    available: bool,
}

impl RecordingTransport {
    pub fn open() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            available: true,
        }
    }

    /// Rejects every send as if the session were not open.
    pub fn unavailable() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            available: false,
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    fn name(&self) -> &str {
        "recording"
    }

    fn state(&self) -> SessionState {
        if self.available {
            SessionState::Open
        } else {
            SessionState::Idle
        }
    }

    async fn send(&self, command: &str) -> Result<(), TransportError> {
        if !self.available {
            return Err(TransportError::Unavailable("not open".to_string()));
        }
        self.sent.lock().unwrap().push(command.to_string());
        Ok(())
    }

    fn close(&self) {}
}
