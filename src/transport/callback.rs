//! Request/response transport: an async function from command to output.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::future::BoxFuture;
use log::{debug, info};

use super::{EventSender, SessionState, Transport, TransportError, TransportEvent, emit};

/// The handler a host registers for controlled mode.
pub type CommandHandler = Arc<dyn Fn(String) -> BoxFuture<'static, String> + Send + Sync>;

/// Wraps an async closure as a `CommandHandler`.
pub fn command_handler<F, Fut>(f: F) -> CommandHandler
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = String> + Send + 'static,
{
    Arc::new(move |input: String| -> BoxFuture<'static, String> { Box::pin(f(input)) })
}

/// Runs each command through `<shell> -c` and returns stdout followed by stderr.
pub fn shell_handler(shell: String) -> CommandHandler {
    command_handler(move |input: String| {
        let shell = shell.clone();
        async move {
            debug!("shell: {} -c {:?}", shell, input);
            match tokio::process::Command::new(&shell)
                .arg("-c")
                .arg(&input)
                .output()
                .await
            {
                Ok(output) => {
                    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
                    text.push_str(&String::from_utf8_lossy(&output.stderr));
                    text.trim_end().to_string()
                }
                Err(e) => format!("{shell}: {e}"),
            }
        }
    })
}

pub struct CallbackTransport {
    handler: CommandHandler,
    events: EventSender,
    closed: AtomicBool,
}

impl CallbackTransport {
    pub fn new(handler: CommandHandler, events: EventSender) -> Self {
        Self {
            handler,
            events,
            closed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Transport for CallbackTransport {
    fn name(&self) -> &str {
        "Callback"
    }

    fn state(&self) -> SessionState {
        if self.closed.load(Ordering::SeqCst) {
            SessionState::Closed
        } else {
            SessionState::Open
        }
    }

    async fn send(&self, command: &str) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Unavailable("callback closed".to_string()));
        }
        let result = (self.handler)(command.to_string()).await;
        debug!("callback returned {} bytes", result.len());
        emit(&self.events, TransportEvent::Record(result))
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("callback session closed");
            let _ = emit(&self.events, TransportEvent::Closed { reason: None });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_send_emits_one_record() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let transport = CallbackTransport::new(
            command_handler(|input: String| async move { format!("you said {input}") }),
            tx,
        );

        transport.send("hi").await.unwrap();

        assert_eq!(rx.recv().await, Some(TransportEvent::Record("you said hi".to_string())));
    }

    #[tokio::test]
    async fn test_close_emits_closed_once_and_blocks_sends() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let transport = CallbackTransport::new(command_handler(|input: String| async move { input }), tx);

        transport.close();
        transport.close();

        assert_eq!(rx.recv().await, Some(TransportEvent::Closed { reason: None }));
        assert!(rx.try_recv().is_err());
        assert_eq!(transport.state(), SessionState::Closed);
        assert!(matches!(
            transport.send("late").await,
            Err(TransportError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_shell_handler_captures_output() {
        let run = shell_handler("sh".to_string());
        assert_eq!(run("echo hello".to_string()).await, "hello");
    }
}
