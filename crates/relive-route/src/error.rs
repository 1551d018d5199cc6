//! Error types for route processing.

use thiserror::Error;

/// Result type for route operations.
pub type RouteResult<T> = Result<T, RouteError>;

/// Errors that abort route processing.
///
/// Provider failures are not represented here: road snapping falls back to
/// the original coordinates and never fails the route.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("No {0} column found in input")]
    ColumnNotFound(String),

    #[error("Input has no header row")]
    MissingHeader,

    #[error("No valid GPS rows remain after cleaning ({0} rows read)")]
    NoValidRows(usize),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RouteError {
    /// Create a missing column error.
    pub fn column_not_found(kind: impl Into<String>) -> Self {
        Self::ColumnNotFound(kind.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Whether the error was caused by the input data rather than the environment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            RouteError::ColumnNotFound(_)
                | RouteError::MissingHeader
                | RouteError::NoValidRows(_)
                | RouteError::Csv(_)
        )
    }
}
