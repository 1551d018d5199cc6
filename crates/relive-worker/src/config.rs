//! Worker configuration.
//!
//! [`WorkerConfig`] holds deployment settings from the environment;
//! [`RunConfig`] holds the algorithm and rendering settings of one run,
//! optionally read from a JSON file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use relive_media::RenderConfig;
use relive_models::VideoSettings;
use relive_route::PipelineConfig;
use serde::{Deserialize, Serialize};

use crate::error::{WorkerError, WorkerResult};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Directory receiving the video and the viewer document
    pub output_dir: PathBuf,
    /// File name of the rendered video
    pub video_name: String,
    /// Maximum concurrent street-level photo requests
    pub photo_workers: usize,
    /// How long FFmpeg may take to finish after the last frame
    pub encoder_timeout: Duration,
    /// Write Prometheus metrics here at exit
    pub metrics_file: Option<PathBuf>,
    /// Emit logs as JSON
    pub log_json: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            video_name: "relive.mp4".to_string(),
            photo_workers: 5,
            encoder_timeout: Duration::from_secs(600),
            metrics_file: None,
            log_json: false,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            output_dir: std::env::var("RELIVE_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("output")),
            video_name: std::env::var("RELIVE_VIDEO_NAME").unwrap_or_else(|_| "relive.mp4".to_string()),
            photo_workers: std::env::var("RELIVE_PHOTO_WORKERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(5),
            encoder_timeout: Duration::from_secs(
                std::env::var("RELIVE_ENCODER_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            metrics_file: std::env::var("METRICS_FILE").ok().map(PathBuf::from),
            log_json: std::env::var("LOG_FORMAT")
                .map(|v| v.to_lowercase() == "json")
                .unwrap_or(false),
        }
    }

    pub fn video_path(&self) -> PathBuf {
        self.output_dir.join(&self.video_name)
    }

    pub fn viewer_path(&self) -> PathBuf {
        self.output_dir.join("viewer.json")
    }
}

/// Settings for one run.
///
/// Pipeline sections (`route`, `matching`, `stops`, `camera`, `frames`)
/// sit at the top level next to `render` and `video`. Every field is
/// optional in the JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    #[serde(flatten)]
    pub pipeline: PipelineConfig,
    pub render: RenderConfig,
    pub video: VideoSettings,
}

impl RunConfig {
    pub fn from_json(json: &str) -> WorkerResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| WorkerError::config_error(format!("malformed run config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> WorkerResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> WorkerResult<()> {
        self.pipeline.validate()?;

        let video = &self.video;
        if video.width == 0 || video.height == 0 {
            return Err(WorkerError::config_error("video resolution must be positive"));
        }
        if video.width % 2 != 0 || video.height % 2 != 0 {
            return Err(WorkerError::config_error(format!(
                "video resolution {}x{} must be even for {}",
                video.width, video.height, video.pixel_format
            )));
        }
        Ok(())
    }

    /// Output settings; the frame rate always follows `frames.fps`.
    pub fn video_settings(&self) -> VideoSettings {
        VideoSettings {
            fps: self.pipeline.frames.fps,
            ..self.video.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.photo_workers, 5);
        assert_eq!(config.video_path(), PathBuf::from("output/relive.mp4"));
        assert_eq!(config.viewer_path(), PathBuf::from("output/viewer.json"));
    }

    #[test]
    fn test_partial_run_config() {
        let config = RunConfig::from_json(
            r#"{
                "stops": {"min_duration_seconds": 60.0},
                "frames": {"fps": 24},
                "render": {"tile_cache_capacity": 16},
                "video": {"width": 800, "height": 600}
            }"#,
        )
        .unwrap();

        assert_eq!(config.pipeline.stops.min_duration_seconds, 60.0);
        assert_eq!(config.pipeline.stops.speed_threshold_kmh, 3.0);
        assert_eq!(config.render.tile_cache_capacity, 16);
        assert_eq!(config.render.stop_photo_proximity, 15);

        let video = config.video_settings();
        assert_eq!((video.width, video.height, video.fps), (800, 600, 24));
        assert_eq!(video.crf, 20);
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(RunConfig::from_json("{}").unwrap(), RunConfig::default());
    }

    #[test]
    fn test_rejects_odd_resolution() {
        let result = RunConfig::from_json(r#"{"video": {"width": 801, "height": 600}}"#);
        assert!(matches!(result, Err(WorkerError::ConfigError(_))));
    }

    #[test]
    fn test_rejects_invalid_pipeline() {
        let result = RunConfig::from_json(r#"{"frames": {"fps": 0}}"#);
        assert!(matches!(result, Err(WorkerError::Route(_))));
    }
}
