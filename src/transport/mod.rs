//! Request/response plumbing between the workflow and the remote service.
//!
//! The workflow never talks to an HTTP library directly. It builds a
//! [`RemoteRequest`], hands it to a [`Transport`], and inspects the
//! [`RemoteResponse`] that comes back. This keeps every phase testable
//! against [`MockTransport`].
//!
//! - [`http`] - `reqwest`-backed transport used by the CLI
//! - [`mock`] - scripted transport for tests

pub mod http;
pub mod mock;

pub use http::HttpTransport;
pub use mock::MockTransport;

use crate::core::error::{Phase, ScanError};

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// HTTP methods used by the scan protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
        }
    }
}

/// Body of a remote request.
#[derive(Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// No body.
    Empty,

    /// Raw bytes.
    Bytes(Vec<u8>),

    /// A single-file `multipart/form-data` body.
    Multipart {
        /// Form field name.
        field: String,
        /// Filename carried in the part's content disposition.
        filename: String,
        /// File content.
        data: Vec<u8>,
    },
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Empty"),
            Self::Bytes(data) => f.debug_struct("Bytes").field("len", &data.len()).finish(),
            Self::Multipart {
                field,
                filename,
                data,
            } => f
                .debug_struct("Multipart")
                .field("field", field)
                .field("filename", filename)
                .field("len", &data.len())
                .finish(),
        }
    }
}

/// A single outbound request, built fresh for every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRequest {
    /// Request method.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// Headers in insertion order.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: RequestBody,
    /// Workflow phase issuing the request, used to tag transport errors.
    pub phase: Phase,
}

impl RemoteRequest {
    /// Creates a `GET` request.
    pub fn get(url: impl Into<String>, phase: Phase) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            body: RequestBody::Empty,
            phase,
        }
    }

    /// Creates a `POST` request with the given body.
    pub fn post(url: impl Into<String>, body: RequestBody, phase: Phase) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: Vec::new(),
            body,
            phase,
        }
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns the first value of a header, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A response from the remote service.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteResponse {
    /// HTTP status code.
    pub status: u16,
    /// Canonical reason phrase, e.g. `Not Found`; may be empty.
    pub reason: String,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl fmt::Debug for RemoteResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteResponse")
            .field("status", &self.status)
            .field("reason", &self.reason)
            .field("body_len", &self.body.len())
            .finish()
    }
}

impl RemoteResponse {
    /// Creates a response with the canonical reason for `status`.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            reason: canonical_reason(status).to_string(),
            body: body.into(),
        }
    }

    /// Returns the status line text, e.g. `404 Not Found`.
    pub fn status_text(&self) -> String {
        if self.reason.is_empty() {
            self.status.to_string()
        } else {
            format!("{} {}", self.status, self.reason)
        }
    }

    /// Returns the body as lossy UTF-8, trimmed.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).trim().to_string()
    }
}

/// Reason phrases for the statuses this client is likely to see.
fn canonical_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        408 => "Request Timeout",
        413 => "Payload Too Large",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "",
    }
}

/// Sends requests to the remote service.
///
/// Implementations perform exactly one network exchange per call. They must
/// not retry; a failure to obtain a response is returned as
/// `ScanError::Transport` or `ScanError::Timeout` tagged with the request's
/// phase. Any response, whatever its status, is `Ok`.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Sends a request and returns the response.
    async fn send(&self, request: RemoteRequest) -> Result<RemoteResponse, ScanError>;
}

/// A shared transport handle.
pub type ArcTransport = Arc<dyn Transport>;
