//! HTTP transport over `reqwest`.
//!
//! One [`HttpTransport`] is built per invocation with the configured
//! per-request timeout. The timeout bounds a single call only; the poll loop
//! carries its own bounds.

use crate::core::error::{Phase, ScanError};
use crate::transport::{Method, RemoteRequest, RemoteResponse, RequestBody, Transport};

use async_trait::async_trait;
use std::time::Duration;

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Creates a transport whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, ScanError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("metascan/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ScanError::configuration(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, timeout })
    }

    /// Returns the per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Converts a [`RemoteRequest`] into a `reqwest` request without sending it.
    fn build(&self, request: RemoteRequest) -> Result<reqwest::Request, ScanError> {
        let phase = request.phase;
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = self.client.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Bytes(data) => builder.body(data),
            RequestBody::Multipart {
                field,
                filename,
                data,
            } => {
                let part = reqwest::multipart::Part::bytes(data).file_name(filename);
                builder.multipart(reqwest::multipart::Form::new().part(field, part))
            }
        };

        builder
            .build()
            .map_err(|e| ScanError::transport(phase, format!("invalid request: {e}")))
    }

    fn map_error(&self, phase: Phase, error: reqwest::Error) -> ScanError {
        if error.is_timeout() {
            ScanError::Timeout {
                phase,
                elapsed: self.timeout,
            }
        } else {
            ScanError::transport(phase, error.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: RemoteRequest) -> Result<RemoteResponse, ScanError> {
        let phase = request.phase;
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            phase = %phase,
            "Sending request"
        );

        let http_request = self.build(request)?;
        let response = self
            .client
            .execute(http_request)
            .await
            .map_err(|e| self.map_error(phase, e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_error(phase, e))?;

        tracing::debug!(
            status = status.as_u16(),
            body_len = body.len(),
            phase = %phase,
            "Received response"
        );

        Ok(RemoteResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body: body.to_vec(),
        })
    }
}
