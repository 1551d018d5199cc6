//! Output video settings.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "medium";
/// Default CRF (Constant Rate Factor); 18-23 is visually lossless for map footage
pub const DEFAULT_CRF: u8 = 20;
/// Default output frame rate
pub const DEFAULT_FPS: u32 = 30;
/// Default output resolution
pub const DEFAULT_WIDTH: u32 = 1400;
pub const DEFAULT_HEIGHT: u32 = 1050;
/// Pixel format accepted by most players
pub const DEFAULT_PIXEL_FORMAT: &str = "yuv420p";

/// Resolution, frame rate and encoder settings of the rendered video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoSettings {
    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Video codec (e.g., "libx264", "h264_nvenc")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Encoding preset (e.g., "fast", "medium", "slow")
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant Rate Factor (quality, 0-51, lower is better)
    #[serde(default = "default_crf")]
    pub crf: u8,

    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,

    /// Additional FFmpeg output arguments
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_width() -> u32 {
    DEFAULT_WIDTH
}
fn default_height() -> u32 {
    DEFAULT_HEIGHT
}
fn default_fps() -> u32 {
    DEFAULT_FPS
}
fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_crf() -> u8 {
    DEFAULT_CRF
}
fn default_pixel_format() -> String {
    DEFAULT_PIXEL_FORMAT.to_string()
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fps: DEFAULT_FPS,
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: DEFAULT_CRF,
            pixel_format: DEFAULT_PIXEL_FORMAT.to_string(),
            extra_args: Vec::new(),
        }
    }
}

impl VideoSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Small, fast settings for previews.
    pub fn preview() -> Self {
        Self {
            width: 700,
            height: 525,
            preset: "veryfast".to_string(),
            crf: 26,
            ..Default::default()
        }
    }

    /// Returns a new config with updated resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Returns a new config with updated CRF.
    pub fn with_crf(mut self, crf: u8) -> Self {
        self.crf = crf;
        self
    }

    /// Size in bytes of one raw RGB24 frame.
    pub fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    /// Duration in seconds of a video with `frames` frames.
    pub fn duration_for_frames(&self, frames: usize) -> f64 {
        if self.fps == 0 {
            return 0.0;
        }
        frames as f64 / self.fps as f64
    }

    /// Build FFmpeg output arguments for these settings.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args = vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-pix_fmt".to_string(),
            self.pixel_format.clone(),
            "-movflags".to_string(),
            "+faststart".to_string(),
        ];
        args.extend(self.extra_args.clone());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = VideoSettings::default();
        assert_eq!(settings.fps, 30);
        assert_eq!(settings.crf, 20);
        assert_eq!(settings.frame_bytes(), 1400 * 1050 * 3);
    }

    #[test]
    fn test_ffmpeg_args() {
        let args = VideoSettings::default().with_crf(18).to_ffmpeg_args();
        assert!(args.windows(2).any(|w| w[0] == "-crf" && w[1] == "18"));
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"+faststart".to_string()));
    }

    #[test]
    fn test_partial_deserialization_uses_defaults() {
        let settings: VideoSettings = serde_json::from_str(r#"{"width": 640, "height": 480}"#).unwrap();
        assert_eq!(settings.width, 640);
        assert_eq!(settings.fps, DEFAULT_FPS);
        assert_eq!(settings.preset, DEFAULT_PRESET);
    }

    #[test]
    fn test_duration_for_frames() {
        let settings = VideoSettings::default();
        assert!((settings.duration_for_frames(90) - 3.0).abs() < 1e-9);
    }
}
