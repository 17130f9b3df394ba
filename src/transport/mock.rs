//! Scripted transport for testing.
//!
//! [`MockTransport`] replays a fixed sequence of responses (or transport
//! failures) in order and records every request it receives, so tests can
//! assert both what the workflow sent and how it reacted.

use crate::core::error::ScanError;
use crate::transport::{RemoteRequest, RemoteResponse, Transport};

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Scripted {
    Respond(RemoteResponse),
    Timeout(Duration),
    ConnectionFailed(String),
}

/// A transport that replays scripted responses.
///
/// # Examples
///
/// ```rust
/// use metascan::transport::MockTransport;
///
/// let transport = MockTransport::new()
///     .with_response(404, r#"{"error":"not found"}"#)
///     .with_json(200, serde_json::json!({"data_id": "abc", "in_queue": 0}));
/// assert_eq!(transport.remaining(), 2);
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<RemoteRequest>>,
    send_count: AtomicU64,
}

impl MockTransport {
    /// Creates a transport with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a response with a raw body.
    pub fn with_response(self, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.push(Scripted::Respond(RemoteResponse::new(status, body)));
        self
    }

    /// Appends a response whose body is the given JSON value.
    pub fn with_json(self, status: u16, body: serde_json::Value) -> Self {
        self.with_response(status, body.to_string())
    }

    /// Appends a timeout failure.
    pub fn with_timeout(self, elapsed: Duration) -> Self {
        self.push(Scripted::Timeout(elapsed));
        self
    }

    /// Appends a connection failure.
    pub fn with_connection_failure(self, message: impl Into<String>) -> Self {
        self.push(Scripted::ConnectionFailed(message.into()));
        self
    }

    /// Appends a response to a shared transport.
    pub fn push_response(&self, status: u16, body: impl Into<Vec<u8>>) {
        self.push(Scripted::Respond(RemoteResponse::new(status, body)));
    }

    /// Returns a copy of every request received so far.
    pub fn requests(&self) -> Vec<RemoteRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Returns the number of requests received.
    pub fn request_count(&self) -> u64 {
        self.send_count.load(Ordering::Relaxed)
    }

    /// Returns the number of scripted entries not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn push(&self, entry: Scripted) {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(entry);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: RemoteRequest) -> Result<RemoteResponse, ScanError> {
        self.send_count.fetch_add(1, Ordering::Relaxed);
        let phase = request.phase;
        let url = request.url.clone();

        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request);

        let next = self
            .script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();

        match next {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Timeout(elapsed)) => Err(ScanError::Timeout { phase, elapsed }),
            Some(Scripted::ConnectionFailed(message)) => Err(ScanError::transport(phase, message)),
            None => Err(ScanError::transport(
                phase,
                format!("no scripted response left for {url}"),
            )),
        }
    }
}
