//! Sequencing of the scan phases.

use crate::audit;
use crate::core::{ContentDigest, Payload, Phase, ReportSource, ScanError, ScanReport, ScanTarget};
use crate::transport::ArcTransport;
use crate::workflow::config::ClientConfig;
use crate::workflow::poll::ScanPoller;
use crate::workflow::probe::HashProbe;
use crate::workflow::render::render;
use crate::workflow::submit::UploadSubmitter;

use std::fmt;
use uuid::Uuid;

/// States of one workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowState {
    /// Nothing sent yet.
    Start,
    /// Waiting on the hash lookup.
    ProbingHash,
    /// The service knew the digest; rendering its payload.
    ReportingCachedResult,
    /// Uploading the file.
    Submitting,
    /// Waiting for the queued scan to finish.
    Polling,
    /// Rendering the completed scan's payload.
    ReportingFreshResult,
    /// Report produced.
    Done,
    /// A fatal error ended the run.
    Failed,
}

impl WorkflowState {
    /// Returns `true` for `Done` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::ProbingHash => "probing_hash",
            Self::ReportingCachedResult => "reporting_cached_result",
            Self::Submitting => "submitting",
            Self::Polling => "polling",
            Self::ReportingFreshResult => "reporting_fresh_result",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// How the workflow reads a hash lookup status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    /// 200: the body is a full scan payload.
    Hit,
    /// 404: the service has never scanned this content.
    Miss,
    /// Anything else.
    Unexpected,
}

impl LookupOutcome {
    /// Classifies a lookup status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            200 => Self::Hit,
            404 => Self::Miss,
            _ => Self::Unexpected,
        }
    }
}

/// Runs hash lookup, then (on a miss) upload and polling, then rendering.
///
/// Exactly one of the two paths runs per call. Every error ends the run; the
/// orchestrator never retries and never exits the process.
#[derive(Clone)]
pub struct Orchestrator {
    config: ClientConfig,
    transport: ArcTransport,
}

impl Orchestrator {
    /// Creates an orchestrator after validating the configuration.
    pub fn new(config: ClientConfig, transport: ArcTransport) -> Result<Self, ScanError> {
        config.validate()?;
        Ok(Self { config, transport })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Scans `target` and returns its report.
    pub async fn run(&self, target: &ScanTarget) -> Result<ScanReport, ScanError> {
        let run_id = Uuid::new_v4().to_string();

        match self.drive(&run_id, target).await {
            Ok(report) => {
                enter(&run_id, WorkflowState::Done);
                audit::emit_report(&run_id, &report);
                Ok(report)
            }
            Err(e) => {
                enter(&run_id, WorkflowState::Failed);
                audit::emit_run_failed(&run_id, &e);
                Err(e)
            }
        }
    }

    async fn drive(&self, run_id: &str, target: &ScanTarget) -> Result<ScanReport, ScanError> {
        enter(run_id, WorkflowState::Start);
        let digest = ContentDigest::compute(self.config.digest_algorithm, target.bytes());
        audit::emit_run_started(run_id, target, &digest);

        enter(run_id, WorkflowState::ProbingHash);
        let transport = self.transport.as_ref();
        let response = HashProbe::new(&self.config, transport)
            .lookup(&digest)
            .await?;
        audit::emit_hash_lookup(run_id, &digest, response.status);

        match LookupOutcome::from_status(response.status) {
            LookupOutcome::Hit => {
                enter(run_id, WorkflowState::ReportingCachedResult);
                let payload = Payload::decode(&response.body, Phase::HashLookup)?;
                Ok(render(&payload, ReportSource::Cached).with_digest(digest.to_hex()))
            }
            LookupOutcome::Miss => {
                enter(run_id, WorkflowState::Submitting);
                let submission = UploadSubmitter::new(&self.config, transport)
                    .submit(target)
                    .await?;
                audit::emit_submission_accepted(run_id, target, &submission);

                enter(run_id, WorkflowState::Polling);
                let data_id = submission.data_id.as_str();
                let completed = ScanPoller::new(&self.config, transport)
                    .wait_with_progress(data_id, |attempt, progress| {
                        audit::emit_poll_progress(run_id, data_id, attempt, progress)
                    })
                    .await?;

                enter(run_id, WorkflowState::ReportingFreshResult);
                Ok(render(&completed.payload, ReportSource::Fresh)
                    .with_digest(digest.to_hex())
                    .with_data_id(data_id))
            }
            LookupOutcome::Unexpected => Err(ScanError::unexpected_status(
                Phase::HashLookup,
                response.status_text(),
            )),
        }
    }
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn enter(run_id: &str, state: WorkflowState) {
    tracing::debug!(run_id = %run_id, state = %state, "Workflow state");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Method, MockTransport};
    use crate::workflow::config::PollConfig;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn config() -> ClientConfig {
        ClientConfig::new("test-key")
            .with_base_url("https://api.example.test/v4")
            .with_poll(PollConfig::new().with_poll_interval(Duration::ZERO))
    }

    fn cached_payload() -> serde_json::Value {
        json!({
            "scan_results": {
                "scan_all_result_a": "No Threat Detected",
                "progress_percentage": 100,
                "scan_details": {
                    "Avira": {"threat_found": "", "scan_result_i": 0, "def_time": "2024-05-02"}
                }
            }
        })
    }

    #[test]
    fn test_lookup_classification() {
        assert_eq!(LookupOutcome::from_status(200), LookupOutcome::Hit);
        assert_eq!(LookupOutcome::from_status(404), LookupOutcome::Miss);
        assert_eq!(LookupOutcome::from_status(401), LookupOutcome::Unexpected);
        assert_eq!(LookupOutcome::from_status(500), LookupOutcome::Unexpected);
    }

    #[test]
    fn test_terminal_states() {
        assert!(WorkflowState::Done.is_terminal());
        assert!(WorkflowState::Failed.is_terminal());
        assert!(!WorkflowState::Polling.is_terminal());
        assert_eq!(WorkflowState::ProbingHash.to_string(), "probing_hash");
    }

    #[test]
    fn test_new_validates_config() {
        let transport: ArcTransport = Arc::new(MockTransport::new());
        assert!(Orchestrator::new(ClientConfig::new(""), transport).is_err());
    }

    #[tokio::test]
    async fn test_cache_hit_skips_upload() {
        let transport = Arc::new(MockTransport::new().with_json(200, cached_payload()));
        let orchestrator = Orchestrator::new(config(), transport.clone()).unwrap();
        let target = ScanTarget::from_bytes("clean.txt", b"hello world".to_vec());

        let report = orchestrator.run(&target).await.unwrap();

        assert_eq!(report.source, ReportSource::Cached);
        assert_eq!(report.overall_status, "No Threat Detected");
        assert_eq!(report.digest.as_deref(), Some("5eb63bbbe01eeed093cb22bb8f5acdc3"));
        assert_eq!(report.data_id, None);
        assert_eq!(transport.request_count(), 1);
        assert!(transport.requests().iter().all(|r| r.method == Method::Get));
    }

    #[tokio::test]
    async fn test_unexpected_lookup_status_fails() {
        let transport = Arc::new(
            MockTransport::new()
                .with_json(401, json!({"error": {"messages": ["Invalid apikey"]}})),
        );
        let orchestrator = Orchestrator::new(config(), transport.clone()).unwrap();
        let target = ScanTarget::from_bytes("a.bin", b"a".to_vec());

        let err = orchestrator.run(&target).await.unwrap_err();
        match err {
            ScanError::UnexpectedStatus { phase, status } => {
                assert_eq!(phase, Phase::HashLookup);
                assert_eq!(status, "401 Unauthorized");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_cache_hit_with_bad_json_is_decode_error() {
        let transport = Arc::new(MockTransport::new().with_response(200, "not json"));
        let orchestrator = Orchestrator::new(config(), transport).unwrap();
        let target = ScanTarget::from_bytes("a.bin", b"a".to_vec());

        let err = orchestrator.run(&target).await.unwrap_err();
        assert!(matches!(err, ScanError::Decode { phase: Phase::HashLookup, .. }));
    }

    #[tokio::test]
    async fn test_miss_uploads_then_polls() {
        let transport = Arc::new(
            MockTransport::new()
                .with_json(404, json!({"error": {"code": 404003, "messages": ["The hash was not found"]}}))
                .with_json(200, json!({"data_id": "d1", "in_queue": 0}))
                .with_json(200, json!({"scan_results": {"progress_percentage": 50}}))
                .with_json(200, cached_payload()),
        );
        let orchestrator = Orchestrator::new(config(), transport.clone()).unwrap();
        let target = ScanTarget::from_bytes("/tmp/sample.exe", b"MZ payload".to_vec());

        let report = orchestrator.run(&target).await.unwrap();
        assert_eq!(report.source, ReportSource::Fresh);
        assert_eq!(report.data_id.as_deref(), Some("d1"));
        assert_eq!(report.engine_count(), 1);

        let requests = transport.requests();
        assert_eq!(requests.len(), 4);
        assert!(requests[0].url.contains("/hash/"));
        assert_eq!(requests[1].url, "https://api.example.test/v4/file");
        assert_eq!(requests[2].url, "https://api.example.test/v4/file/d1");
        assert_eq!(requests[3].url, "https://api.example.test/v4/file/d1");
    }

    #[tokio::test]
    async fn test_rejected_upload_stops_before_polling() {
        let transport = Arc::new(
            MockTransport::new()
                .with_response(404, "")
                .with_json(400, json!({"error": "bad file"})),
        );
        let orchestrator = Orchestrator::new(config(), transport.clone()).unwrap();
        let target = ScanTarget::from_bytes("bad.bin", b"??".to_vec());

        let err = orchestrator.run(&target).await.unwrap_err();
        assert!(matches!(err, ScanError::SubmissionRejected { .. }));
        assert!(err.to_string().contains("bad file"));
        assert_eq!(transport.request_count(), 2);
    }
}
