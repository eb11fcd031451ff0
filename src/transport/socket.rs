//! WebSocket transport.
//!
//! The session lives in one background task that owns both halves of the
//! socket. Commands reach it through an outbound queue; inbound text frames
//! are forwarded unframed as `TransportEvent::Text`.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use super::{EventSender, SessionState, Transport, TransportError, TransportEvent, emit};

enum Outbound {
    Frame(String),
    Close,
}

pub struct SocketTransport {
    session_id: String,
    outbound: mpsc::UnboundedSender<Outbound>,
    state: watch::Receiver<SessionState>,
}

impl SocketTransport {
    /// Starts the session in the background, waiting `delay` before connecting.
    /// Must be called from within a tokio runtime.
    pub fn connect(url: String, delay: Duration, events: EventSender) -> Self {
        let session_id = uuid::Uuid::new_v4().to_string();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SessionState::Idle);

        info!("socket session {} → {} (delay {:?})", session_id, url, delay);
        tokio::spawn(run_session(
            session_id.clone(),
            url,
            delay,
            events,
            outbound_rx,
            state_tx,
        ));

        Self {
            session_id,
            outbound: outbound_tx,
            state: state_rx,
        }
    }

    /// Resolves once the session has left `Idle`/`Connecting`.
    pub async fn wait_settled(&self) -> SessionState {
        let mut state = self.state.clone();
        match state
            .wait_for(|s| !matches!(s, SessionState::Idle | SessionState::Connecting))
            .await
        {
            Ok(s) => *s,
            Err(_) => SessionState::Closed,
        }
    }
}

#[async_trait]
impl Transport for SocketTransport {
    fn name(&self) -> &str {
        "WebSocket"
    }

    fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    async fn send(&self, command: &str) -> Result<(), TransportError> {
        if !self.state().is_open() {
            return Err(TransportError::Unavailable(format!(
                "socket session {} is {:?}",
                self.session_id,
                self.state()
            )));
        }
        self.outbound
            .send(Outbound::Frame(format!("{command}\n")))
            .map_err(|_| TransportError::Unavailable("socket task has exited".to_string()))
    }

    fn close(&self) {
        debug!("socket session {}: close requested", self.session_id);
        let _ = self.outbound.send(Outbound::Close);
    }
}

async fn run_session(
    session_id: String,
    url: String,
    delay: Duration,
    events: EventSender,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    state: watch::Sender<SessionState>,
) {
    // A close requested during the delay ends the session without connecting.
    let wait = tokio::time::sleep(delay);
    tokio::pin!(wait);
    loop {
        tokio::select! {
            _ = &mut wait => break,
            out = outbound.recv() => match out {
                Some(Outbound::Frame(_)) => debug!("socket session {}: frame before connect dropped", session_id),
                Some(Outbound::Close) | None => {
                    info!("socket session {} closed before connecting", session_id);
                    state.send_replace(SessionState::Closed);
                    let _ = emit(&events, TransportEvent::Closed { reason: None });
                    return;
                }
            },
        }
    }

    state.send_replace(SessionState::Connecting);
    let stream = match connect_async(url.as_str()).await {
        Ok((stream, response)) => {
            debug!("socket session {} handshake: {}", session_id, response.status());
            stream
        }
        Err(e) => {
            warn!("socket session {} failed to connect: {}", session_id, e);
            state.send_replace(SessionState::Errored);
            let _ = emit(&events, TransportEvent::Closed { reason: Some(e.to_string()) });
            return;
        }
    };

    state.send_replace(SessionState::Open);
    if emit(&events, TransportEvent::Opened).is_err() {
        return;
    }
    info!("socket session {} open", session_id);

    let (mut sink, mut inbound) = stream.split();
    let mut reason: Option<String> = None;

    loop {
        tokio::select! {
            frame = inbound.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    state.send_replace(SessionState::Streaming);
                    debug!("socket session {}: {} bytes in", session_id, text.len());
                    if emit(&events, TransportEvent::Text(text)).is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Binary(bytes))) => {
                    state.send_replace(SessionState::Streaming);
                    let text = String::from_utf8_lossy(&bytes).into_owned();
                    if emit(&events, TransportEvent::Text(text)).is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!("socket session {}: remote close {:?}", session_id, frame);
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("socket session {} read error: {}", session_id, e);
                    reason = Some(e.to_string());
                    break;
                }
                None => break,
            },
            out = outbound.recv() => match out {
                Some(Outbound::Frame(text)) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        warn!("socket session {} write error: {}", session_id, e);
                        reason = Some(e.to_string());
                        break;
                    }
                }
                Some(Outbound::Close) | None => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },
        }
    }

    state.send_replace(if reason.is_some() {
        SessionState::Errored
    } else {
        SessionState::Closed
    });
    info!("socket session {} closed", session_id);
    let _ = emit(&events, TransportEvent::Closed { reason });
}
