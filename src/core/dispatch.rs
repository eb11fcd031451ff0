//! # Command Dispatch
//!
//! A finished command either matches a local built-in or is forwarded to
//! whatever transport the active mode selected. Forwarding never fails the
//! caller: undeliverable commands are dropped, transport errors are logged
//! (the transport itself puts a closed record in the transcript).

use std::sync::Arc;

use log::{debug, info, warn};

use crate::transport::{Transport, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Builtin(Builtin),
    Forward,
}

/// Decides where a command goes. Built-ins match trimmed and case-insensitively.
pub fn route(command: &str) -> Route {
    if command.trim().eq_ignore_ascii_case("clear") {
        Route::Builtin(Builtin::Clear)
    } else {
        Route::Forward
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    /// No transport for the active mode, or its session is not open.
    Dropped,
    Failed(String),
}

/// Forwards commands to the transport of the active mode. Cheap to clone,
/// so each dispatch can run in its own task.
#[derive(Clone, Default)]
pub struct CommandDispatcher {
    transport: Option<Arc<dyn Transport>>,
}

impl CommandDispatcher {
    pub fn new(transport: Option<Arc<dyn Transport>>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> Option<&Arc<dyn Transport>> {
        self.transport.as_ref()
    }

    pub async fn dispatch(&self, command: String) -> DispatchOutcome {
        let Some(transport) = &self.transport else {
            debug!("no transport for command, dropping {:?}", command);
            return DispatchOutcome::Dropped;
        };

        info!("dispatching {} byte command via {}", command.len(), transport.name());
        match transport.send(&command).await {
            Ok(()) => DispatchOutcome::Sent,
            Err(TransportError::Unavailable(why)) => {
                debug!("{} unavailable, dropping command: {}", transport.name(), why);
                DispatchOutcome::Dropped
            }
            Err(e) => {
                warn!("{} dispatch failed: {}", transport.name(), e);
                DispatchOutcome::Failed(e.to_string())
            }
        }
    }
}
