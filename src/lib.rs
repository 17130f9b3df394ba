//! # Metascan
//!
//! A hash-first scanning client for MetaDefender Cloud.
//!
//! ## Overview
//!
//! Scanning a file costs an upload and a wait, so metascan first asks the
//! service whether it already holds a verdict for the file's content digest:
//!
//! - On a cache hit the cached payload is rendered straight away
//! - On a miss the file is uploaded, the queued scan is polled until it
//!   reports 100%, and the final payload is rendered
//! - Every response is read through tolerant dotted-path lookups, so engine
//!   entries with missing fields still render
//! - Polling is bounded by attempt count and wall-clock time
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use metascan::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new(std::env::var("METADEFENDER_API_KEY")?);
//!     let transport = HttpTransport::new(config.timeout)?;
//!     let orchestrator = Orchestrator::new(config, Arc::new(transport))?;
//!
//!     let target = ScanTarget::load("suspicious.exe")?;
//!     let report = orchestrator.run(&target).await?;
//!     println!("{report}");
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **Core**: the data model, digests, the JSON payload accessor and errors
//! - **Transport**: the request/response seam, over `reqwest` or a mock
//! - **Workflow**: hash probe, upload, polling, rendering and the orchestrator
//! - **Audit**: structured `tracing` events tied together by a run id

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod audit;
pub mod core;
pub mod transport;
pub mod workflow;

// Re-export commonly used types at the crate root
pub use crate::core::{
    ContentDigest, DigestAlgorithm, EngineVerdict, Payload, Phase, ReportSource, ScanError,
    ScanProgress, ScanReport, ScanSubmission, ScanTarget,
};

pub use crate::transport::{HttpTransport, MockTransport, Transport};
pub use crate::workflow::{ClientConfig, Orchestrator, PollConfig};

/// Prelude module for convenient imports.
///
/// ```rust
/// use metascan::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{
        ContentDigest, DigestAlgorithm, EngineVerdict, Payload, Phase, ReportSource, ScanError,
        ScanProgress, ScanReport, ScanSubmission, ScanTarget,
    };
    pub use crate::transport::{HttpTransport, MockTransport, Transport};
    pub use crate::workflow::{ClientConfig, Orchestrator, PollConfig};
}
