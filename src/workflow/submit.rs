//! Multipart upload of the target file.

use crate::core::{Payload, Phase, ScanError, ScanSubmission, ScanTarget};
use crate::transport::{RemoteRequest, RemoteResponse, RequestBody, Transport};
use crate::workflow::config::ClientConfig;

use serde_json::Value;

/// Multipart form field carrying the file.
pub const FILE_FIELD: &str = "file";

/// Uploads a file for scanning and parses the acceptance.
#[derive(Debug, Clone, Copy)]
pub struct UploadSubmitter<'a> {
    config: &'a ClientConfig,
    transport: &'a dyn Transport,
}

impl<'a> UploadSubmitter<'a> {
    /// Creates a submitter over the given configuration and transport.
    pub fn new(config: &'a ClientConfig, transport: &'a dyn Transport) -> Self {
        Self { config, transport }
    }

    /// Builds the `POST {base}/file` request.
    ///
    /// The base filename goes both into the multipart part and into the
    /// advisory `filename` header.
    pub fn request(&self, target: &ScanTarget) -> RemoteRequest {
        let filename = target.filename();
        let body = RequestBody::Multipart {
            field: FILE_FIELD.to_string(),
            filename: filename.clone(),
            data: target.bytes().to_vec(),
        };

        RemoteRequest::post(self.config.endpoint("file"), body, Phase::Upload)
            .with_header("apikey", self.config.api_key())
            .with_header("filename", header_safe(&filename))
    }

    /// Uploads the file and returns the queued scan's identifier.
    ///
    /// # Errors
    ///
    /// - `SubmissionRejected` on HTTP 400, carrying the service's message
    /// - `MalformedResponse` on HTTP 200 without a `data_id`
    /// - `UnexpectedStatus` on any other status
    /// - transport errors, unretried
    pub async fn submit(&self, target: &ScanTarget) -> Result<ScanSubmission, ScanError> {
        tracing::info!(
            filename = %target.filename(),
            file_size = target.len(),
            "Uploading file for scanning"
        );

        let response = self.transport.send(self.request(target)).await?;
        let submission = parse_submission(&response)?;

        tracing::info!(
            data_id = %submission.data_id,
            in_queue = ?submission.in_queue,
            "Upload successful"
        );
        Ok(submission)
    }
}

/// Classifies an upload response.
pub(crate) fn parse_submission(response: &RemoteResponse) -> Result<ScanSubmission, ScanError> {
    match response.status {
        200 => {
            let payload = Payload::decode(&response.body, Phase::Upload)?;
            let data_id = match payload.lookup("data_id") {
                Some(Value::String(id)) if !id.is_empty() => id.clone(),
                Some(Value::Number(id)) => id.to_string(),
                _ => {
                    return Err(ScanError::malformed(
                        Phase::Upload,
                        "response has no data_id",
                    ))
                }
            };

            Ok(ScanSubmission {
                data_id,
                in_queue: payload.f64_at("in_queue"),
            })
        }
        400 => {
            // A rejection without a JSON message still carries useful text.
            let message = Payload::decode(&response.body, Phase::Upload)
                .ok()
                .and_then(|payload| payload.message())
                .or_else(|| Some(response.body_text()).filter(|text| !text.is_empty()))
                .unwrap_or_else(|| response.status_text());

            Err(ScanError::SubmissionRejected { message })
        }
        _ => Err(ScanError::unexpected_status(
            Phase::Upload,
            response.status_text(),
        )),
    }
}

/// Makes a filename usable as an HTTP header value.
///
/// Header values must be visible ASCII; anything else becomes `_`.
fn header_safe(filename: &str) -> String {
    filename
        .chars()
        .map(|c| if c == ' ' || c.is_ascii_graphic() { c } else { '_' })
        .collect()
}
