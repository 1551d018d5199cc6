//! Progress channel message types.
//!
//! Each message is serialized as one JSON object per line so a supervising
//! process can follow a run in real time.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Pipeline stage reported alongside progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStage {
    /// Loading, cleaning, matching, stop detection, frame generation
    Processing,
    /// Frame rendering and encoding
    Rendering,
    /// Video written
    Success,
    /// Run aborted
    Error,
}

impl ProgressStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStage::Processing => "processing",
            ProgressStage::Rendering => "rendering",
            ProgressStage::Success => "success",
            ProgressStage::Error => "error",
        }
    }

    /// Whether no further messages follow this stage.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressStage::Success | ProgressStage::Error)
    }
}

/// A single progress update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProgressMessage {
    pub stage: ProgressStage,
    /// Percent complete (0-100)
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ProgressMessage {
    /// Create a progress message for a named step.
    pub fn step(
        stage: ProgressStage,
        progress: u8,
        step: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            stage,
            progress: progress.min(100),
            step: Some(step.into()),
            message: Some(message.into()),
            timestamp: Utc::now(),
        }
    }

    /// Create a bare rendering progress tick.
    pub fn rendering(progress: u8) -> Self {
        Self {
            stage: ProgressStage::Rendering,
            progress: progress.min(100),
            step: None,
            message: None,
            timestamp: Utc::now(),
        }
    }

    /// Create the final success message.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            stage: ProgressStage::Success,
            progress: 100,
            step: Some("Complete".to_string()),
            message: Some(message.into()),
            timestamp: Utc::now(),
        }
    }

    /// Create an error message.
    ///
    /// `progress` should be the last value reported before the failure.
    pub fn error(progress: u8, message: impl Into<String>) -> Self {
        Self {
            stage: ProgressStage::Error,
            progress: progress.min(100),
            step: Some("Error".to_string()),
            message: Some(message.into()),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_serialization() {
        let json = serde_json::to_string(&ProgressStage::Rendering).unwrap();
        assert_eq!(json, "\"rendering\"");
        assert_eq!(ProgressStage::Success.as_str(), "success");
    }

    #[test]
    fn test_progress_is_capped() {
        let msg = ProgressMessage::rendering(250);
        assert_eq!(msg.progress, 100);
    }

    #[test]
    fn test_step_message_fields() {
        let msg = ProgressMessage::step(
            ProgressStage::Processing,
            25,
            "Stop Detection",
            "Detecting stops...",
        );
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["stage"], "processing");
        assert_eq!(json["progress"], 25);
        assert_eq!(json["step"], "Stop Detection");
        assert!(json.get("timestamp").is_some());
    }

    #[test]
    fn test_rendering_tick_omits_optional_fields() {
        let json = serde_json::to_value(ProgressMessage::rendering(80)).unwrap();
        assert!(json.get("step").is_none());
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_terminal_stages() {
        assert!(ProgressStage::Success.is_terminal());
        assert!(ProgressStage::Error.is_terminal());
        assert!(!ProgressStage::Rendering.is_terminal());
    }
}
