//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Errors that end a run.
///
/// Provider failures during snapping, photo capture and tile fetching are
/// handled where they happen and never surface here.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Route error: {0}")]
    Route(#[from] relive_route::RouteError),

    #[error("Media error: {0}")]
    Media(#[from] relive_media::MediaError),

    #[error("Provider error: {0}")]
    Provider(#[from] relive_providers::ProviderError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Whether the run failed because of the input file rather than the environment.
    pub fn is_input_error(&self) -> bool {
        matches!(self, WorkerError::Route(e) if e.is_input_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relive_route::RouteError;

    #[test]
    fn test_input_errors() {
        assert!(WorkerError::from(RouteError::NoValidRows(12)).is_input_error());
        assert!(WorkerError::from(RouteError::column_not_found("latitude")).is_input_error());
        assert!(!WorkerError::from(relive_media::MediaError::NoFrames).is_input_error());
        assert!(!WorkerError::config_error("missing key").is_input_error());
    }
}
