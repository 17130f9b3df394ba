//! Core types used throughout the metascan library.
//!
//! These are the normalized shapes the workflow extracts from the service's
//! JSON payloads: the upload acceptance, the poll progress, and the final
//! per-engine report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Acceptance of an uploaded file into the scan queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSubmission {
    /// Opaque identifier of the queued scan; the key for every poll request.
    pub data_id: String,

    /// Queue position at submission time, if the service reported one.
    pub in_queue: Option<f64>,
}

/// Completion indicator extracted from one poll response.
///
/// The value is whatever the service sent; it is not assumed to be
/// monotonic or even present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanProgress {
    /// `scan_results.progress_percentage`, if numeric.
    pub progress_percentage: Option<f64>,
}

impl ScanProgress {
    /// Creates a progress value.
    pub fn new(progress_percentage: Option<f64>) -> Self {
        Self {
            progress_percentage,
        }
    }

    /// Returns `true` only when the reported progress is exactly 100.
    pub fn is_complete(&self) -> bool {
        self.progress_percentage == Some(100.0)
    }
}

impl fmt::Display for ScanProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.progress_percentage {
            Some(p) => write!(f, "{p}%"),
            None => write!(f, "unknown"),
        }
    }
}

/// One engine's verdict on the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineVerdict {
    /// Threat name reported by the engine; empty when none.
    pub threat_found: String,

    /// Engine result code (`scan_result_i`); 0 means no threat.
    pub scan_result: i64,

    /// Signature definition timestamp (`def_time`), as sent.
    pub definition_time: String,
}

impl EngineVerdict {
    /// Creates a verdict from its three fields.
    pub fn new(
        threat_found: impl Into<String>,
        scan_result: i64,
        definition_time: impl Into<String>,
    ) -> Self {
        Self {
            threat_found: threat_found.into(),
            scan_result,
            definition_time: definition_time.into(),
        }
    }

    /// Returns `true` if the engine named a threat.
    pub fn is_detection(&self) -> bool {
        !self.threat_found.is_empty()
    }
}

/// Where a report's payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSource {
    /// The service already knew the file's digest.
    Cached,
    /// The file was uploaded and scanned during this invocation.
    Fresh,
}

impl fmt::Display for ReportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cached => write!(f, "cached result"),
            Self::Fresh => write!(f, "fresh scan"),
        }
    }
}

/// The normalized verdict report, produced once per invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Overall status (`scan_all_result_a`), e.g. "No Threat Detected".
    pub overall_status: String,

    /// Per-engine verdicts, keyed by engine name.
    pub engines: BTreeMap<String, EngineVerdict>,

    /// Number of engines that took part, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_avs: Option<u64>,

    /// Number of engines that detected a threat, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_detected_avs: Option<u64>,

    /// Whether the report came from the cache or a fresh scan.
    pub source: ReportSource,

    /// Hex digest used for the cache lookup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,

    /// Scan identifier, when the file was uploaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_id: Option<String>,

    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
}

impl ScanReport {
    /// Creates a report with the given status, engine verdicts and source.
    pub fn new(
        overall_status: impl Into<String>,
        engines: BTreeMap<String, EngineVerdict>,
        source: ReportSource,
    ) -> Self {
        Self {
            overall_status: overall_status.into(),
            engines,
            total_avs: None,
            total_detected_avs: None,
            source,
            digest: None,
            data_id: None,
            generated_at: Utc::now(),
        }
    }

    /// Sets the lookup digest.
    pub fn with_digest(mut self, digest: impl Into<String>) -> Self {
        self.digest = Some(digest.into());
        self
    }

    /// Sets the scan identifier.
    pub fn with_data_id(mut self, data_id: impl Into<String>) -> Self {
        self.data_id = Some(data_id.into());
        self
    }

    /// Returns the verdict for one engine.
    pub fn engine(&self, name: &str) -> Option<&EngineVerdict> {
        self.engines.get(name)
    }

    /// Returns the number of engines in the report.
    pub fn engine_count(&self) -> usize {
        self.engines.len()
    }

    /// Returns the names of engines that reported a threat.
    pub fn detecting_engines(&self) -> Vec<&str> {
        self.engines
            .iter()
            .filter(|(_, verdict)| verdict.is_detection())
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.overall_status.is_empty() {
            "(not reported)"
        } else {
            &self.overall_status
        };
        writeln!(f, "Overall status: {status}")?;
        writeln!(f, "Source:         {}", self.source)?;
        if let Some(digest) = &self.digest {
            writeln!(f, "Digest:         {digest}")?;
        }
        if let Some(data_id) = &self.data_id {
            writeln!(f, "Data ID:        {data_id}")?;
        }
        if let (Some(detected), Some(total)) = (self.total_detected_avs, self.total_avs) {
            writeln!(f, "Detections:     {detected}/{total}")?;
        }

        if self.engines.is_empty() {
            return writeln!(f, "\nNo engine results reported.");
        }

        let name_width = self
            .engines
            .keys()
            .map(|name| name.len())
            .max()
            .unwrap_or(0)
            .max("ENGINE".len());
        let threat_width = self
            .engines
            .values()
            .map(|v| v.threat_found.len())
            .max()
            .unwrap_or(0)
            .max("THREAT".len());

        writeln!(f)?;
        writeln!(
            f,
            "{:<name_width$}  {:<threat_width$}  {:>6}  DEFINITIONS",
            "ENGINE", "THREAT", "RESULT"
        )?;
        for (name, verdict) in &self.engines {
            writeln!(
                f,
                "{:<name_width$}  {:<threat_width$}  {:>6}  {}",
                name, verdict.threat_found, verdict.scan_result, verdict.definition_time
            )?;
        }
        Ok(())
    }
}
