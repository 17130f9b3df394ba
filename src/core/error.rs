//! Error types for the metascan library.
//!
//! Every failure in the scan workflow is returned as a [`ScanError`] value.
//! Nothing in the library retries or exits the process; the caller decides
//! what a failure means for the invocation.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The network-touching phase of the workflow in which an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Cache lookup by content digest.
    HashLookup,
    /// Multipart upload of the file.
    Upload,
    /// Polling for scan completion.
    Polling,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HashLookup => write!(f, "hash lookup"),
            Self::Upload => write!(f, "upload"),
            Self::Polling => write!(f, "polling"),
        }
    }
}

/// The main error type for scan operations.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The target file could not be read.
    #[error("cannot read file '{}': {source}", path.display())]
    FileUnreadable {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The request never produced a response (DNS, refused connection, TLS, ...).
    #[error("{phase} request failed: {message}")]
    Transport {
        /// Phase that issued the request.
        phase: Phase,
        /// Error message from the transport.
        message: String,
    },

    /// The request exceeded the per-request timeout.
    #[error("{phase} request timed out after {elapsed:?}")]
    Timeout {
        /// Phase that issued the request.
        phase: Phase,
        /// Configured timeout that elapsed.
        elapsed: Duration,
    },

    /// A response body was not valid JSON.
    #[error("invalid JSON in {phase} response: {message}")]
    Decode {
        /// Phase whose response failed to decode.
        phase: Phase,
        /// Parser error message.
        message: String,
    },

    /// The service refused the upload (HTTP 400).
    #[error("upload rejected by the service: {message}")]
    SubmissionRejected {
        /// Error text supplied by the service.
        message: String,
    },

    /// The service answered 200 but left out a required field.
    #[error("malformed {phase} response: {details}")]
    MalformedResponse {
        /// Phase whose response was malformed.
        phase: Phase,
        /// What was missing or wrong.
        details: String,
    },

    /// The service answered with a status the workflow does not handle.
    #[error("unexpected {phase} response status: {status}")]
    UnexpectedStatus {
        /// Phase that received the status.
        phase: Phase,
        /// Status line, e.g. `503 Service Unavailable`.
        status: String,
    },

    /// The scan did not reach 100% within the configured poll bounds.
    #[error(
        "scan did not complete after {attempts} polls in {elapsed:?} (last progress: {})",
        last_progress.map(|p| format!("{p}%")).unwrap_or_else(|| "unknown".to_string())
    )]
    PollLimitExceeded {
        /// Number of poll requests issued.
        attempts: u32,
        /// Wall-clock time spent polling.
        elapsed: Duration,
        /// Last progress value seen, if any was numeric.
        last_progress: Option<f64>,
    },

    /// Client configuration is invalid.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },
}

impl ScanError {
    /// Returns `true` if the request never produced a response.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }

    /// Returns the workflow phase this error is associated with, if any.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::Transport { phase, .. }
            | Self::Timeout { phase, .. }
            | Self::Decode { phase, .. }
            | Self::MalformedResponse { phase, .. }
            | Self::UnexpectedStatus { phase, .. } => Some(*phase),
            Self::SubmissionRejected { .. } => Some(Phase::Upload),
            Self::PollLimitExceeded { .. } => Some(Phase::Polling),
            Self::FileUnreadable { .. } | Self::Configuration { .. } => None,
        }
    }

    /// Creates a `Transport` error.
    pub fn transport(phase: Phase, message: impl Into<String>) -> Self {
        Self::Transport {
            phase,
            message: message.into(),
        }
    }

    /// Creates a `Decode` error.
    pub fn decode(phase: Phase, message: impl Into<String>) -> Self {
        Self::Decode {
            phase,
            message: message.into(),
        }
    }

    /// Creates a `MalformedResponse` error.
    pub fn malformed(phase: Phase, details: impl Into<String>) -> Self {
        Self::MalformedResponse {
            phase,
            details: details.into(),
        }
    }

    /// Creates an `UnexpectedStatus` error.
    pub fn unexpected_status(phase: Phase, status: impl Into<String>) -> Self {
        Self::UnexpectedStatus {
            phase,
            status: status.into(),
        }
    }

    /// Creates a `Configuration` error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
