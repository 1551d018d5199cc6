//! Provider error types.

use relive_media::MediaError;
use relive_route::MatchError;
use thiserror::Error;

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Missing API key: {0}")]
    MissingApiKey(&'static str),

    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),

    #[error("Provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No imagery at this location: {0}")]
    NoImagery(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProviderError {
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Network(_) => true,
            ProviderError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<ProviderError> for MediaError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Image(e) => MediaError::Image(e),
            other => MediaError::tile(other.to_string()),
        }
    }
}

impl From<ProviderError> for MatchError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Status { status, body } => MatchError::Status {
                status,
                message: body,
            },
            ProviderError::Network(e) => MatchError::request(e.to_string()),
            ProviderError::Json(e) => MatchError::malformed(e.to_string()),
            ProviderError::InvalidResponse(msg) => MatchError::Malformed(msg),
            ProviderError::NoImagery(msg) => MatchError::NoMatch(msg),
            other => MatchError::request(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        let status = |s| ProviderError::Status {
            status: s,
            body: String::new(),
        };
        assert!(status(429).is_retryable());
        assert!(status(503).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!ProviderError::MissingApiKey("MAPBOX_API_KEY").is_retryable());
    }

    #[test]
    fn test_conversions_keep_meaning() {
        let media: MediaError = ProviderError::invalid_response("bad tile").into();
        assert!(media.is_frame_recoverable());

        let matched: MatchError = ProviderError::Status {
            status: 502,
            body: "gateway".into(),
        }
        .into();
        assert!(matched.is_retryable());
    }
}
