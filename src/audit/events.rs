//! Audit event emission functions.

use crate::core::{ContentDigest, ScanError, ScanProgress, ScanReport, ScanSubmission, ScanTarget};

use serde::{Deserialize, Serialize};

/// Tracing target for every audit event.
pub const AUDIT_TARGET: &str = "metascan::audit";

/// Summary of one detecting engine for audit logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionSummary {
    /// Engine name.
    pub engine: String,
    /// Threat name reported by the engine.
    pub threat: String,
}

impl DetectionSummary {
    /// Collects the detecting engines of a report.
    pub fn from_report(report: &ScanReport) -> Vec<Self> {
        report
            .engines
            .iter()
            .filter(|(_, verdict)| verdict.is_detection())
            .map(|(engine, verdict)| Self {
                engine: engine.clone(),
                threat: verdict.threat_found.clone(),
            })
            .collect()
    }
}

/// Emits an audit event for the start of a run.
pub fn emit_run_started(run_id: &str, target: &ScanTarget, digest: &ContentDigest) {
    tracing::info!(
        target: AUDIT_TARGET,
        event_type = "run_started",
        run_id = %run_id,
        path = %target.path().display(),
        file_size = target.len(),
        digest = %digest,
        "Scan run started"
    );
}

/// Emits an audit event for the hash lookup response.
pub fn emit_hash_lookup(run_id: &str, digest: &ContentDigest, status: u16) {
    tracing::info!(
        target: AUDIT_TARGET,
        event_type = "hash_lookup",
        run_id = %run_id,
        digest = %digest,
        status = status,
        cache_hit = status == 200,
        "Hash lookup completed"
    );
}

/// Emits an audit event for an accepted upload.
pub fn emit_submission_accepted(run_id: &str, target: &ScanTarget, submission: &ScanSubmission) {
    tracing::info!(
        target: AUDIT_TARGET,
        event_type = "submission_accepted",
        run_id = %run_id,
        filename = %target.filename(),
        data_id = %submission.data_id,
        in_queue = ?submission.in_queue,
        "Upload accepted"
    );
}

/// Emits an audit event for one poll response.
pub fn emit_poll_progress(run_id: &str, data_id: &str, attempt: u32, progress: &ScanProgress) {
    tracing::debug!(
        target: AUDIT_TARGET,
        event_type = "poll_progress",
        run_id = %run_id,
        data_id = %data_id,
        attempt = attempt,
        progress = ?progress.progress_percentage,
        "Scan progress"
    );
}

/// Emits an audit event for the final report.
pub fn emit_report(run_id: &str, report: &ScanReport) {
    let detections = DetectionSummary::from_report(report);

    tracing::info!(
        target: AUDIT_TARGET,
        event_type = "scan_report",
        run_id = %run_id,
        source = ?report.source,
        overall_status = %report.overall_status,
        digest = ?report.digest,
        data_id = ?report.data_id,
        engine_count = report.engine_count(),
        detections = ?detections,
        detection_count = detections.len(),
        "Scan report generated"
    );
}

/// Emits an audit event for a failed run.
pub fn emit_run_failed(run_id: &str, error: &ScanError) {
    tracing::warn!(
        target: AUDIT_TARGET,
        event_type = "run_failed",
        run_id = %run_id,
        phase = ?error.phase(),
        transport = error.is_transport(),
        error = %error,
        "Scan run failed"
    );
}
