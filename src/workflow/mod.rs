//! The hash-first scan workflow.
//!
//! One run is a fixed sequence of phases, each implemented by its own
//! component borrowing the shared [`ClientConfig`] and transport:
//!
//! - [`HashProbe`] looks the content digest up in the service cache
//! - [`UploadSubmitter`] uploads the file on a cache miss
//! - [`ScanPoller`] polls the queued scan until it reports 100%
//! - [`render`] maps the final payload onto a [`ScanReport`](crate::core::ScanReport)
//!
//! [`Orchestrator`] drives them and owns the branching between the cached
//! and fresh paths.

pub mod config;
pub mod orchestrator;
pub mod poll;
pub mod probe;
pub mod render;
pub mod submit;

pub use config::{ClientConfig, PollConfig, DEFAULT_BASE_URL};
pub use orchestrator::{LookupOutcome, Orchestrator, WorkflowState};
pub use poll::{CompletedScan, ScanPoller};
pub use probe::HashProbe;
pub use render::render;
pub use submit::UploadSubmitter;
