//! Mapping a final scan payload onto a [`ScanReport`].

use crate::core::payload::field_text;
use crate::core::{EngineVerdict, Payload, ReportSource, ScanReport};

use serde_json::Value;
use std::collections::BTreeMap;

/// Overall verdict string.
pub const STATUS_PATH: &str = "scan_results.scan_all_result_a";
/// Object mapping engine name to that engine's result.
pub const DETAILS_PATH: &str = "scan_results.scan_details";

const TOTAL_AVS_PATH: &str = "scan_results.total_avs";
const TOTAL_DETECTED_PATH: &str = "scan_results.total_detected_avs";

/// Builds a report from a final payload.
///
/// Works the same for a cached lookup body and a completed poll body;
/// `source` records which of the two it was. The
/// engine set is whatever `scan_details` contains; absent per-engine fields
/// become empty strings or zero.
pub fn render(payload: &Payload, source: ReportSource) -> ScanReport {
    let engines: BTreeMap<String, EngineVerdict> = payload
        .entries(DETAILS_PATH)
        .map(|(engine, detail)| (engine.to_string(), verdict(detail)))
        .collect();

    let status = payload.str_at(STATUS_PATH).unwrap_or_default();
    let mut report = ScanReport::new(status, engines, source);
    report.total_avs = payload.u64_at(TOTAL_AVS_PATH);
    report.total_detected_avs = payload.u64_at(TOTAL_DETECTED_PATH);
    report
}

fn verdict(detail: &Value) -> EngineVerdict {
    let scan_result = detail
        .get("scan_result_i")
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
        .unwrap_or(0);

    EngineVerdict {
        threat_found: field_text(detail, "threat_found"),
        scan_result,
        definition_time: field_text(detail, "def_time"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_engine_verbatim() {
        let payload = Payload::from_value(json!({
            "scan_results": {
                "scan_details": {
                    "engineA": {"threat_found": "EICAR", "scan_result_i": 1, "def_time": "2024-01-01"}
                }
            }
        }));

        let report = render(&payload, ReportSource::Fresh);
        assert_eq!(report.engine_count(), 1);
        assert_eq!(
            report.engine("engineA"),
            Some(&EngineVerdict::new("EICAR", 1, "2024-01-01"))
        );
    }

    #[test]
    fn test_full_payload() {
        let payload = Payload::from_value(json!({
            "data_id": "bzIwMTExMEhKc0pp",
            "scan_results": {
                "scan_all_result_a": "Infected",
                "scan_all_result_i": 1,
                "total_avs": 3,
                "total_detected_avs": 1,
                "progress_percentage": 100,
                "scan_details": {
                    "ClamAV": {"threat_found": "Eicar-Signature", "scan_result_i": 1, "def_time": "2024-05-01T00:00:00.000Z", "scan_time": 12},
                    "Avira": {"threat_found": "", "scan_result_i": 0, "def_time": "2024-05-02T00:00:00.000Z"},
                    "K7": {"threat_found": null, "scan_result_i": 10.0, "def_time": "2024-05-03T00:00:00.000Z"}
                }
            }
        }));

        let report = render(&payload, ReportSource::Fresh);
        assert_eq!(report.overall_status, "Infected");
        assert_eq!(report.source, ReportSource::Fresh);
        assert_eq!(report.total_avs, Some(3));
        assert_eq!(report.total_detected_avs, Some(1));
        assert_eq!(report.detecting_engines(), vec!["ClamAV"]);
        assert_eq!(report.engine("K7").unwrap().scan_result, 10);
        assert_eq!(report.engine("K7").unwrap().threat_found, "");
    }

    #[test]
    fn test_missing_fields_render_empty() {
        let payload = Payload::from_value(json!({
            "scan_results": {"scan_details": {"Bare": {}, "NotAnObject": 7}}
        }));

        let report = render(&payload, ReportSource::Fresh);
        assert_eq!(report.overall_status, "");
        assert_eq!(report.total_avs, None);
        assert_eq!(report.engine("Bare"), Some(&EngineVerdict::default()));
        assert_eq!(report.engine("NotAnObject"), Some(&EngineVerdict::default()));
    }

    #[test]
    fn test_no_scan_results() {
        let report = render(
            &Payload::from_value(json!({"error": "nope"})),
            ReportSource::Cached,
        );
        assert_eq!(report.engine_count(), 0);
    }
}
