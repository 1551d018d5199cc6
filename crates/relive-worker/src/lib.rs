//! Route-to-video pipeline runner.
//!
//! This crate provides:
//! - Environment and per-run configuration
//! - Structured logging and Prometheus metrics
//! - The `PROGRESS:` line channel on stdout
//! - Bounded parallel stop photo capture
//! - Viewer document output
//! - Pipeline orchestration from CSV to encoded video

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod photos;
pub mod pipeline;
pub mod progress;
pub mod viewer;

pub use config::{RunConfig, WorkerConfig};
pub use error::{WorkerError, WorkerResult};
pub use logging::{init_tracing, RunLogger};
pub use pipeline::{Pipeline, PreparedRoute, Providers, RunSummary};
pub use progress::ProgressEmitter;
