//! Polling a queued scan until it completes.
//!
//! The loop stops only when `scan_results.progress_percentage` is exactly
//! 100. Lower values, missing fields, non-numeric values and error payloads
//! all mean "keep polling", so a stalled scan is indistinguishable from a
//! slow one. [`PollConfig`] bounds the loop by attempt count and wall-clock
//! time so that a stalled scan ends in `PollLimitExceeded` instead of
//! running forever.

use crate::core::{Payload, Phase, ScanError, ScanProgress};
use crate::transport::{RemoteRequest, Transport};
use crate::workflow::config::{ClientConfig, PollConfig};

use tokio::time::Instant;

/// Dotted path of the progress field in poll responses.
pub const PROGRESS_PATH: &str = "scan_results.progress_percentage";

/// The payload of a scan that reached 100%.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedScan {
    /// Decoded body of the final poll response.
    pub payload: Payload,
    /// Number of poll requests issued, including the final one.
    pub attempts: u32,
}

/// Polls `GET {base}/file/{data_id}` until the scan completes.
#[derive(Debug, Clone, Copy)]
pub struct ScanPoller<'a> {
    config: &'a ClientConfig,
    transport: &'a dyn Transport,
}

impl<'a> ScanPoller<'a> {
    /// Creates a poller over the given configuration and transport.
    pub fn new(config: &'a ClientConfig, transport: &'a dyn Transport) -> Self {
        Self { config, transport }
    }

    /// Builds one poll request.
    pub fn request(&self, data_id: &str) -> RemoteRequest {
        RemoteRequest::get(self.config.endpoint(&format!("file/{data_id}")), Phase::Polling)
            .with_header("apikey", self.config.api_key())
            .with_header("x-file-metadata", "0")
    }

    /// Polls until completion.
    pub async fn wait(&self, data_id: &str) -> Result<CompletedScan, ScanError> {
        self.wait_with_progress(data_id, |_, _| {}).await
    }

    /// Polls until completion, calling `on_progress` with the attempt number
    /// and the progress extracted from every response.
    ///
    /// # Errors
    ///
    /// - transport errors and undecodable bodies end the loop immediately
    /// - `PollLimitExceeded` once `max_attempts` or `max_poll_time` is spent
    pub async fn wait_with_progress<F>(
        &self,
        data_id: &str,
        mut on_progress: F,
    ) -> Result<CompletedScan, ScanError>
    where
        F: FnMut(u32, &ScanProgress),
    {
        let PollConfig {
            poll_interval,
            max_attempts,
            max_poll_time,
        } = self.config.poll.clone();

        let started = Instant::now();
        let mut attempts = 0u32;
        let mut last_progress = None;

        loop {
            let elapsed = started.elapsed();
            if attempts >= max_attempts || elapsed >= max_poll_time {
                return Err(ScanError::PollLimitExceeded {
                    attempts,
                    elapsed,
                    last_progress,
                });
            }

            attempts += 1;
            let response = self.transport.send(self.request(data_id)).await?;
            if response.status != 200 {
                tracing::warn!(
                    data_id = %data_id,
                    status = %response.status_text(),
                    "Poll answered with a non-200 status"
                );
            }

            let payload = Payload::decode(&response.body, Phase::Polling)?;
            let progress = ScanProgress::new(payload.f64_at(PROGRESS_PATH));
            on_progress(attempts, &progress);

            tracing::info!(
                data_id = %data_id,
                attempt = attempts,
                progress = %progress,
                "Scan in progress"
            );

            if progress.is_complete() {
                return Ok(CompletedScan { payload, attempts });
            }
            if progress.progress_percentage.is_some() {
                last_progress = progress.progress_percentage;
            }

            if !poll_interval.is_zero() {
                tokio::time::sleep(poll_interval).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use serde_json::json;
    use std::time::Duration;

    fn progress_body(progress: serde_json::Value) -> serde_json::Value {
        json!({"data_id": "abc", "scan_results": {"progress_percentage": progress}})
    }

    fn fast_config() -> ClientConfig {
        ClientConfig::new("k").with_poll(PollConfig::new().with_poll_interval(Duration::ZERO))
    }

    #[test]
    fn test_request_shape() {
        let config = ClientConfig::new("k").with_base_url("https://api.example.test/v4");
        let transport = MockTransport::new();
        let request = ScanPoller::new(&config, &transport).request("bzIwMTEx");

        assert_eq!(request.url, "https://api.example.test/v4/file/bzIwMTEx");
        assert_eq!(request.header("apikey"), Some("k"));
        assert_eq!(request.header("x-file-metadata"), Some("0"));
    }

    #[tokio::test]
    async fn test_stops_at_exactly_100() {
        let config = fast_config();
        let transport = MockTransport::new()
            .with_json(200, progress_body(json!(10)))
            .with_json(200, progress_body(json!(55)))
            .with_json(
                200,
                json!({"scan_results": {"progress_percentage": 100, "scan_all_result_a": "No Threat Detected"}}),
            )
            .with_json(200, progress_body(json!(100)));

        let mut seen = Vec::new();
        let completed = ScanPoller::new(&config, &transport)
            .wait_with_progress("abc", |attempt, progress| {
                seen.push((attempt, progress.progress_percentage))
            })
            .await
            .unwrap();

        assert_eq!(completed.attempts, 3);
        assert_eq!(transport.request_count(), 3);
        assert_eq!(
            completed.payload.str_at("scan_results.scan_all_result_a"),
            Some("No Threat Detected")
        );
        assert_eq!(seen, vec![(1, Some(10.0)), (2, Some(55.0)), (3, Some(100.0))]);
    }

    #[tokio::test]
    async fn test_non_numeric_and_missing_progress_continue() {
        let config = fast_config();
        let transport = MockTransport::new()
            .with_json(200, json!({"scan_results": {}}))
            .with_json(200, progress_body(json!("100")))
            .with_json(404, json!({"error": {"messages": ["not ready"]}}))
            .with_json(200, progress_body(json!(100.0)));

        let completed = ScanPoller::new(&config, &transport).wait("abc").await.unwrap();
        assert_eq!(completed.attempts, 4);
    }

    #[tokio::test]
    async fn test_attempt_limit() {
        let config = ClientConfig::new("k").with_poll(
            PollConfig::new()
                .with_poll_interval(Duration::ZERO)
                .with_max_attempts(2),
        );
        let transport = MockTransport::new()
            .with_json(200, progress_body(json!(10)))
            .with_json(200, progress_body(json!(20)))
            .with_json(200, progress_body(json!(100)));

        let err = ScanPoller::new(&config, &transport).wait("abc").await.unwrap_err();
        match err {
            ScanError::PollLimitExceeded {
                attempts,
                last_progress,
                ..
            } => {
                assert_eq!(attempts, 2);
                assert_eq!(last_progress, Some(20.0));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(transport.remaining(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_limit() {
        let config = ClientConfig::new("k").with_poll(
            PollConfig::new()
                .with_poll_interval(Duration::from_millis(100))
                .with_max_poll_time(Duration::from_millis(250)),
        );
        let transport = MockTransport::new();
        for _ in 0..10 {
            transport.push_response(200, progress_body(json!(40)).to_string());
        }

        let err = ScanPoller::new(&config, &transport).wait("abc").await.unwrap_err();
        assert!(matches!(err, ScanError::PollLimitExceeded { attempts: 3, .. }));
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test]
    async fn test_transport_error_ends_loop() {
        let config = fast_config();
        let transport = MockTransport::new()
            .with_json(200, progress_body(json!(10)))
            .with_timeout(Duration::from_secs(30))
            .with_json(200, progress_body(json!(100)));

        let err = ScanPoller::new(&config, &transport).wait("abc").await.unwrap_err();
        assert!(matches!(err, ScanError::Timeout { phase: Phase::Polling, .. }));
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_undecodable_body_ends_loop() {
        let config = fast_config();
        let transport = MockTransport::new().with_response(502, "<html>Bad Gateway</html>");

        let err = ScanPoller::new(&config, &transport).wait("abc").await.unwrap_err();
        assert!(matches!(err, ScanError::Decode { phase: Phase::Polling, .. }));
    }
}
