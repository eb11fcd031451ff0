//! Server-sent events transport.
//!
//! Every command opens a fresh stream and replaces the previous one. Each
//! stream runs in its own task so a newer command or `close()` can abort it
//! at any point, including while the request is still in flight.
//!
//! - **GET**: `GET {url}?{param}={command}`, parsed as a live SSE stream.
//!   One record per event; end of stream or a read error closes the session.
//! - **POST**: `POST {url}` with the command as JSON or form body. The
//!   response is read chunk by chunk; only `data:` lines become records.

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::AbortHandle;

use super::{EventSender, SessionState, Transport, TransportError, TransportEvent, emit};
use crate::core::framer::LineFramer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamMethod {
    #[default]
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventStreamConfig {
    pub url: String,
    pub method: StreamMethod,
    /// Query parameter (GET) or body field (POST) carrying the command.
    pub command_param: String,
    /// POST only. A type mentioning `json` gets a JSON body, anything else a form body.
    pub content_type: String,
}

// ============================================================================
// Request Building
// ============================================================================

/// `{url}?{param}={command}` with the command percent-encoded.
pub fn get_url(config: &EventStreamConfig, command: &str) -> Result<url::Url, TransportError> {
    let mut url = url::Url::parse(&config.url)
        .map_err(|e| TransportError::Connection(format!("invalid event stream url: {e}")))?;
    url.query_pairs_mut().append_pair(&config.command_param, command);
    Ok(url)
}

/// POST body in the configured encoding.
pub fn post_body(config: &EventStreamConfig, command: &str) -> String {
    if config.content_type.to_ascii_lowercase().contains("json") {
        let mut body = serde_json::Map::new();
        body.insert(
            config.command_param.clone(),
            serde_json::Value::String(command.to_string()),
        );
        serde_json::Value::Object(body).to_string()
    } else {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair(&config.command_param, command)
            .finish()
    }
}

/// The payload of a `data:` line, with the marker and following whitespace removed.
fn data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

/// Decodes UTF-8 across chunk boundaries, holding back an incomplete
/// trailing sequence until the rest of it arrives.
#[derive(Debug, Default)]
struct Utf8Decoder {
    carry: Vec<u8>,
}

impl Utf8Decoder {
    fn decode(&mut self, bytes: &[u8]) -> String {
        self.carry.extend_from_slice(bytes);
        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.carry) {
                Ok(text) => {
                    out.push_str(text);
                    self.carry.clear();
                    return out;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.carry[..valid]));
                    match e.error_len() {
                        // Incomplete sequence at the end: wait for more bytes.
                        None => {
                            self.carry.drain(..valid);
                            return out;
                        }
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.carry.drain(..valid + bad);
                        }
                    }
                }
            }
        }
    }

    fn finish(&mut self) -> String {
        let rest = String::from_utf8_lossy(&self.carry).into_owned();
        self.carry.clear();
        rest
    }
}

// ============================================================================
// Transport
// ============================================================================

pub struct EventStreamTransport {
    job: StreamJob,
    active: Mutex<Option<AbortHandle>>,
    closed: AtomicBool,
}

/// Everything one command's stream needs, cloned into its task.
#[derive(Clone)]
struct StreamJob {
    config: EventStreamConfig,
    client: reqwest::Client,
    events: EventSender,
    state: Arc<watch::Sender<SessionState>>,
}

impl EventStreamTransport {
    pub fn new(config: EventStreamConfig, events: EventSender) -> Self {
        Self {
            job: StreamJob {
                config,
                client: reqwest::Client::new(),
                events,
                state: Arc::new(watch::Sender::new(SessionState::Idle)),
            },
            active: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    /// Aborts the stream currently being read, if any.
    fn abort_active(&self) {
        let previous = self.active.lock().ok().and_then(|mut slot| slot.take());
        if let Some(handle) = previous {
            debug!("replacing active event stream");
            handle.abort();
        }
    }
}

impl StreamJob {
    fn fail(&self, error: TransportError) -> TransportError {
        warn!("event stream failed: {}", error);
        self.state.send_replace(SessionState::Errored);
        let _ = emit(
            &self.events,
            TransportEvent::Closed {
                reason: Some(error.to_string()),
            },
        );
        error
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        Err(TransportError::Http { status, message })
    }

    async fn run(self, command: String) -> Result<(), TransportError> {
        match self.config.method {
            StreamMethod::Get => self.open_get(&command).await,
            StreamMethod::Post => self.post_chunked(&command).await,
        }
    }

    async fn open_get(&self, command: &str) -> Result<(), TransportError> {
        let url = get_url(&self.config, command).map_err(|e| self.fail(e))?;
        info!("event stream GET {}", url);

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| self.fail(TransportError::Connection(e.to_string())))?;
        let response = Self::check_status(response).await.map_err(|e| self.fail(e))?;

        self.state.send_replace(SessionState::Open);
        emit(&self.events, TransportEvent::Opened)?;

        let mut stream = response.bytes_stream().eventsource();
        let mut reason = None;
        let mut count = 0usize;
        while let Some(event) = stream.next().await {
            match event {
                Ok(event) => {
                    count += 1;
                    self.state.send_replace(SessionState::Streaming);
                    emit(&self.events, TransportEvent::Record(event.data))?;
                }
                Err(e) => {
                    warn!("event stream read error: {}", e);
                    reason = Some(e.to_string());
                    break;
                }
            }
        }
        info!("event stream ended after {} event(s)", count);
        self.state.send_replace(if reason.is_some() {
            SessionState::Errored
        } else {
            SessionState::Closed
        });
        emit(&self.events, TransportEvent::Closed { reason })
    }

    /// Emits one record per `data:` line and returns how many there were.
    fn emit_data_lines(&self, lines: Vec<String>) -> Result<usize, TransportError> {
        let mut count = 0;
        for line in lines {
            if let Some(data) = data_payload(&line) {
                count += 1;
                self.state.send_replace(SessionState::Streaming);
                emit(&self.events, TransportEvent::Record(data.to_string()))?;
            }
        }
        Ok(count)
    }

    async fn post_chunked(&self, command: &str) -> Result<(), TransportError> {
        info!("event stream POST {} ({})", self.config.url, self.config.content_type);

        let mut response = self
            .client
            .post(&self.config.url)
            .header(reqwest::header::CONTENT_TYPE, self.config.content_type.as_str())
            .body(post_body(&self.config, command))
            .send()
            .await
            .map_err(|e| self.fail(TransportError::Connection(e.to_string())))?;
        response = Self::check_status(response).await.map_err(|e| self.fail(e))?;

        self.state.send_replace(SessionState::Open);
        emit(&self.events, TransportEvent::Opened)?;

        let mut decoder = Utf8Decoder::default();
        let mut framer = LineFramer::new();
        let mut records = 0usize;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| self.fail(TransportError::Connection(e.to_string())))?
        {
            debug!("Raw chunk received: {} bytes", chunk.len());
            let text = decoder.decode(&chunk);
            records += self.emit_data_lines(framer.push(&text))?;
        }

        let mut tail = framer.push(&decoder.finish());
        tail.extend(framer.finish());
        records += self.emit_data_lines(tail)?;

        info!("event stream POST finished: {} record(s)", records);
        self.state.send_replace(SessionState::Idle);
        Ok(())
    }
}

#[async_trait]
impl Transport for EventStreamTransport {
    fn name(&self) -> &str {
        "Event stream"
    }

    fn state(&self) -> SessionState {
        *self.job.state.borrow()
    }

    /// Runs one command's stream to its end. A later `send` or `close`
    /// aborts it, in which case this returns `Ok` with nothing more emitted.
    async fn send(&self, command: &str) -> Result<(), TransportError> {
        let task = {
            let mut slot = self
                .active
                .lock()
                .map_err(|_| TransportError::Unavailable("event stream lock poisoned".to_string()))?;
            if self.closed.load(Ordering::SeqCst) {
                return Err(TransportError::Unavailable("event stream closed".to_string()));
            }
            if let Some(previous) = slot.take() {
                debug!("replacing active event stream");
                previous.abort();
            }
            self.job.state.send_replace(SessionState::Connecting);
            emit(&self.job.events, TransportEvent::Connecting)?;

            let task = tokio::spawn(self.job.clone().run(command.to_string()));
            *slot = Some(task.abort_handle());
            task
        };

        match task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => {
                debug!("event stream for {:?} was replaced", command);
                Ok(())
            }
            Err(e) => Err(TransportError::Connection(e.to_string())),
        }
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.abort_active();
        let already_ended = self.state().is_finished();
        self.job.state.send_replace(SessionState::Closed);
        if !already_ended {
            info!("event stream closed");
            let _ = emit(&self.job.events, TransportEvent::Closed { reason: None });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(content_type: &str) -> EventStreamConfig {
        EventStreamConfig {
            url: "http://localhost:8080/stream".to_string(),
            method: StreamMethod::Post,
            command_param: "command".to_string(),
            content_type: content_type.to_string(),
        }
    }

    #[test]
    fn test_get_url_encodes_command() {
        let url = get_url(&config("application/json"), "ls -la && echo ü").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/stream?command=ls+-la+%26%26+echo+%C3%BC"
        );
    }

    #[test]
    fn test_get_url_rejects_garbage() {
        let mut cfg = config("application/json");
        cfg.url = "not a url".to_string();
        assert!(matches!(get_url(&cfg, "ls"), Err(TransportError::Connection(_))));
    }

    #[test]
    fn test_post_body_json() {
        let body = post_body(&config("application/json; charset=utf-8"), "say \"hi\"");
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["command"], "say \"hi\"");
    }

    #[test]
    fn test_post_body_form() {
        let body = post_body(&config("application/x-www-form-urlencoded"), "a b&c");
        assert_eq!(body, "command=a+b%26c");
    }

    #[test]
    fn test_data_payload_strips_marker_and_space() {
        assert_eq!(data_payload("data: hello"), Some("hello"));
        assert_eq!(data_payload("data:\t  x"), Some("x"));
        assert_eq!(data_payload("event: ping"), None);
        assert_eq!(data_payload(": comment"), None);
    }

    #[test]
    fn test_utf8_decoder_holds_split_sequence() {
        let bytes = "é!".as_bytes();
        let mut decoder = Utf8Decoder::default();
        assert_eq!(decoder.decode(&bytes[..1]), "");
        assert_eq!(decoder.decode(&bytes[1..]), "é!");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_utf8_decoder_replaces_invalid_bytes() {
        let mut decoder = Utf8Decoder::default();
        assert_eq!(decoder.decode(&[b'a', 0xff, b'b']), "a\u{FFFD}b");
    }

    #[test]
    fn test_stream_method_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            method: StreamMethod,
        }
        let w: Wrapper = toml::from_str("method = \"post\"").unwrap();
        assert_eq!(w.method, StreamMethod::Post);
    }
}
