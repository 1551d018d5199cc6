//! Configuration for the route pipeline.
//!
//! All settings are immutable once a run starts and are passed explicitly to
//! each component. Every struct deserializes from partial JSON, falling back
//! to the defaults below for missing fields.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RouteError, RouteResult};
use crate::smoothing::SmoothingStrategy;

/// Seconds assumed to elapse per sample while stationary, and the sampling
/// interval used to derive speed when the input has none.
pub const STATIONARY_STEP_SECONDS: f64 = 5.0;

/// Speed above which a point counts as moving, in km/h.
pub const MOTION_THRESHOLD_KMH: f64 = 1.0;

/// Geographic region GPS points must fall within (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Default for BoundingBox {
    fn default() -> Self {
        // Taiwan and surrounding waters
        Self {
            min_lat: 20.0,
            max_lat: 27.0,
            min_lon: 118.0,
            max_lon: 123.0,
        }
    }
}

impl BoundingBox {
    /// A box covering the whole globe.
    pub fn world() -> Self {
        Self {
            min_lat: -90.0,
            max_lat: 90.0,
            min_lon: -180.0,
            max_lon: 180.0,
        }
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}

/// Cleaning, speed derivation and smoothing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    pub bounding_box: BoundingBox,

    /// Strategy applied to speed and bearing series (default: Gaussian, window 5)
    pub smoothing: SmoothingStrategy,

    /// Assumed seconds between samples when deriving speed (default: 5.0)
    pub sampling_interval_seconds: f64,

    /// Jumps at or beyond this distance are treated as glitches with zero speed (default: 500 m)
    pub glitch_distance_m: f64,

    /// Minimum speed for time to be integrated from distance (default: 1 km/h)
    pub motion_threshold_kmh: f64,

    /// Seconds credited per stationary sample (default: 5.0)
    pub stationary_step_seconds: f64,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            bounding_box: BoundingBox::default(),
            smoothing: SmoothingStrategy::default(),
            sampling_interval_seconds: STATIONARY_STEP_SECONDS,
            glitch_distance_m: 500.0,
            motion_threshold_kmh: MOTION_THRESHOLD_KMH,
            stationary_step_seconds: STATIONARY_STEP_SECONDS,
        }
    }
}

/// Road snapping settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub enabled: bool,

    /// Points sent per request; the provider rejects more than 100
    pub batch_size: usize,

    /// Pause between batches to stay under provider rate limits (milliseconds)
    pub batch_delay_ms: u64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            batch_size: 100,
            batch_delay_ms: 50,
        }
    }
}

impl MatchingConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

/// Stop detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopConfig {
    pub enabled: bool,

    /// Points at or below this speed count as stopped (default: 3.0 km/h)
    pub speed_threshold_kmh: f64,

    /// Minimum stationary duration for a stop (default: 90 s)
    pub min_duration_seconds: f64,

    /// Minimum distance from the previously accepted stop (default: 50 m)
    pub min_distance_m: f64,

    /// Photos are captured for at most this many stops (default: 20)
    pub max_photos: usize,
}

impl Default for StopConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            speed_threshold_kmh: 3.0,
            min_duration_seconds: 90.0,
            min_distance_m: 50.0,
            max_photos: 20,
        }
    }
}

/// Speed-dependent zoom and pitch limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// When false, every frame uses the base zoom and pitch
    pub dynamic: bool,
    pub zoom_base: f64,
    pub zoom_min: f64,
    pub zoom_max: f64,
    pub pitch_base: f64,
    pub pitch_min: f64,
    pub pitch_max: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            dynamic: true,
            zoom_base: 17.0,
            zoom_min: 16.0,
            zoom_max: 18.0,
            pitch_base: 60.0,
            pitch_min: 50.0,
            pitch_max: 70.0,
        }
    }
}

/// Adaptive frame allocation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Desired video length in seconds (default: 180)
    pub target_duration_seconds: f64,

    /// Output frame rate used to turn the duration into a frame budget (default: 30)
    pub fps: u32,

    pub min_frames_per_segment: usize,
    pub max_frames_per_segment: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            target_duration_seconds: 180.0,
            fps: 30,
            min_frames_per_segment: 1,
            max_frames_per_segment: 8,
        }
    }
}

impl FrameConfig {
    /// Total frame budget for the video.
    pub fn target_frames(&self) -> usize {
        (self.target_duration_seconds * self.fps as f64).max(0.0) as usize
    }
}

/// Every algorithm setting of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub route: RouteConfig,
    pub matching: MatchingConfig,
    pub stops: StopConfig,
    pub camera: CameraConfig,
    pub frames: FrameConfig,
}

impl PipelineConfig {
    /// Parse a (possibly partial) JSON document.
    pub fn from_json(json: &str) -> RouteResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| RouteError::invalid_config(format!("malformed config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the algorithms cannot work with.
    pub fn validate(&self) -> RouteResult<()> {
        if self.matching.batch_size < 2 {
            return Err(RouteError::invalid_config("matching.batch_size must be at least 2"));
        }
        if self.frames.fps == 0 {
            return Err(RouteError::invalid_config("frames.fps must be positive"));
        }
        if self.frames.min_frames_per_segment > self.frames.max_frames_per_segment {
            return Err(RouteError::invalid_config(
                "frames.min_frames_per_segment exceeds frames.max_frames_per_segment",
            ));
        }
        if self.frames.max_frames_per_segment == 0 {
            return Err(RouteError::invalid_config(
                "frames.max_frames_per_segment must be positive",
            ));
        }
        if self.route.sampling_interval_seconds <= 0.0 {
            return Err(RouteError::invalid_config(
                "route.sampling_interval_seconds must be positive",
            ));
        }
        if self.route.smoothing.window() == 0 {
            return Err(RouteError::invalid_config("route.smoothing window must be positive"));
        }
        let bbox = &self.route.bounding_box;
        if bbox.min_lat > bbox.max_lat || bbox.min_lon > bbox.max_lon {
            return Err(RouteError::invalid_config("route.bounding_box is inverted"));
        }
        Ok(())
    }
}
