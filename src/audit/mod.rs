//! Structured audit narration of a scan run.
//!
//! Every phase transition is emitted as a `tracing` event under the
//! `metascan::audit` target, carrying the run id so lines from one
//! invocation can be picked out of an append-mode log file.

mod events;

pub use events::{
    emit_hash_lookup, emit_poll_progress, emit_report, emit_run_failed, emit_run_started,
    emit_submission_accepted, DetectionSummary, AUDIT_TARGET,
};
