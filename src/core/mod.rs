//! Core types for the metascan library.
//!
//! - [`types`] - Normalized results: `ScanSubmission`, `ScanProgress`, `ScanReport`
//! - [`error`] - Structured error types
//! - [`target`] - The file being scanned
//! - [`digest`] - Content digests used as cache keys
//! - [`payload`] - Tolerant JSON path lookup over response bodies

pub mod digest;
pub mod error;
pub mod payload;
pub mod target;
pub mod types;

pub use digest::{ContentDigest, DigestAlgorithm};
pub use error::{Phase, ScanError};
pub use payload::Payload;
pub use target::ScanTarget;
pub use types::{EngineVerdict, ReportSource, ScanProgress, ScanReport, ScanSubmission};
