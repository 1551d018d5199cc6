//! Encoder and render progress.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Progress information from FFmpeg's `-progress` output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FfmpegProgress {
    /// Frames encoded so far
    pub frame: u64,
    /// Current encoding FPS
    pub fps: f64,
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Encoding speed (e.g., 1.5 = 1.5x realtime)
    pub speed: f64,
    /// Whether encoding is complete
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Percentage of `total_frames` encoded.
    pub fn percentage(&self, total_frames: u64) -> f64 {
        if total_frames == 0 {
            return 0.0;
        }
        ((self.frame as f64 / total_frames as f64) * 100.0).min(100.0)
    }

    /// Estimate seconds until `total_frames` are encoded at the current rate.
    pub fn eta_seconds(&self, total_frames: u64) -> Option<f64> {
        if self.fps <= 0.0 {
            return None;
        }
        let remaining = total_frames.saturating_sub(self.frame);
        Some(remaining as f64 / self.fps)
    }
}

/// Per-frame progress of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderProgress {
    /// Frames written so far (1-based after the first frame)
    pub frame: usize,
    pub total: usize,
    /// Frames replaced by the previous frame or a placeholder so far
    pub substituted: usize,
}

impl RenderProgress {
    /// Completed share of the render in [0, 1].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.frame as f64 / self.total as f64).min(1.0)
    }
}

/// Callback type for render progress updates.
pub type RenderProgressCallback = Arc<dyn Fn(RenderProgress) + Send + Sync>;
