//! Structured run logging.
//!
//! Logs always go to stderr: stdout is reserved for the progress channel.

use tracing::{error, info, warn, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

const DEFAULT_FILTER: &str = "warn,relive=info";

/// Install the global subscriber: colored text for terminals, JSON for log
/// collectors. `RUST_LOG` overrides the default filter.
pub fn init_tracing(json: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

/// Run logger attaching the run ID and pipeline stage to every event.
#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
    stage: String,
}

impl RunLogger {
    /// Create a logger with a fresh run ID.
    pub fn new(stage: &str) -> Self {
        Self::with_run_id(&Uuid::new_v4().to_string(), stage)
    }

    pub fn with_run_id(run_id: &str, stage: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            stage: stage.to_string(),
        }
    }

    /// Same run, another stage.
    pub fn for_stage(&self, stage: &str) -> Self {
        Self::with_run_id(&self.run_id, stage)
    }

    pub fn log_start(&self, message: &str) {
        info!(run_id = %self.run_id, stage = %self.stage, "Stage started: {}", message);
    }

    pub fn log_progress(&self, message: &str) {
        info!(run_id = %self.run_id, stage = %self.stage, "Stage progress: {}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(run_id = %self.run_id, stage = %self.stage, "Stage warning: {}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(run_id = %self.run_id, stage = %self.stage, "Stage error: {}", message);
    }

    pub fn log_completion(&self, message: &str) {
        info!(run_id = %self.run_id, stage = %self.stage, "Stage completed: {}", message);
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// Span carrying the run ID and stage.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("run", run_id = %self.run_id, stage = %self.stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_logger_ids() {
        let logger = RunLogger::new("loading");
        assert_eq!(logger.stage(), "loading");
        assert!(Uuid::parse_str(logger.run_id()).is_ok());

        let next = logger.for_stage("rendering");
        assert_eq!(next.run_id(), logger.run_id());
        assert_eq!(next.stage(), "rendering");
    }

    #[test]
    fn test_run_logger_with_run_id() {
        let logger = RunLogger::with_run_id("run-123", "stops");
        assert_eq!(logger.run_id(), "run-123");
        assert_eq!(logger.stage(), "stops");
    }
}
