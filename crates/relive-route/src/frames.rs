//! Importance-weighted frame allocation.
//!
//! The video has a fixed frame budget. Segments where something happens
//! (slowing down, turning, standing still) get more frames than straight
//! stretches at constant speed, then each segment is filled with eased
//! interpolated camera positions.

use relive_models::{CameraPosition, GpsPoint, Track};
use tracing::{debug, info};

use crate::camera::CameraModel;
use crate::config::FrameConfig;
use crate::geo::{bearing_delta, cubic_ease_in_out, interpolate_bearing, lerp};

/// Distributes the frame budget over track segments.
#[derive(Debug, Clone, Default)]
pub struct FrameAllocator {
    config: FrameConfig,
    camera: CameraModel,
}

impl FrameAllocator {
    pub fn new(config: FrameConfig, camera: CameraModel) -> Self {
        Self { config, camera }
    }

    /// Importance of each segment `(i, i + 1)`.
    pub fn importance_scores(&self, track: &Track) -> Vec<f64> {
        let points = track.points();
        (0..track.segment_count())
            .map(|i| {
                let mut score = 1.0;
                if i > 0 {
                    score += (points[i].speed_kmh - points[i - 1].speed_kmh).abs() / 10.0;
                    score += bearing_delta(points[i - 1].bearing_deg, points[i].bearing_deg).abs() / 30.0;
                }
                if points[i].speed_kmh < 20.0 {
                    score += 2.0;
                }
                if points[i].speed_kmh < 5.0 {
                    score += 3.0;
                }
                score
            })
            .collect()
    }

    /// Frames per segment for the given importance scores.
    ///
    /// Each share is rounded and clamped to the configured bounds. If the
    /// clamped total overshoots the budget, every count is scaled down and
    /// floored at one frame.
    pub fn allocate(&self, scores: &[f64]) -> Vec<usize> {
        if scores.is_empty() {
            return Vec::new();
        }

        let target = self.config.target_frames() as f64;
        let min = self.config.min_frames_per_segment;
        let max = self.config.max_frames_per_segment.max(min);
        let total_score: f64 = scores.iter().sum();

        let mut counts: Vec<usize> = scores
            .iter()
            .map(|s| {
                let share = if total_score > 0.0 {
                    s / total_score
                } else {
                    1.0 / scores.len() as f64
                };
                ((share * target).round().max(0.0) as usize).clamp(min, max)
            })
            .collect();

        let total: usize = counts.iter().sum();
        if total as f64 > target {
            let scale = target / total as f64;
            let floor = min.max(1);
            for count in counts.iter_mut() {
                *count = ((*count as f64 * scale).round() as usize).max(floor);
            }
            debug!(
                before = total,
                after = counts.iter().sum::<usize>(),
                "Scaled frame allocation down to budget"
            );
        }

        counts
    }

    /// Camera positions for the whole track, in order.
    ///
    /// Deterministic for a given track and configuration. Tracks with fewer
    /// than two points produce no frames.
    pub fn generate(&self, track: &Track) -> Vec<CameraPosition> {
        if track.len() < 2 {
            return Vec::new();
        }

        let scores = self.importance_scores(track);
        let counts = self.allocate(&scores);
        let points = track.points();

        let mut positions = Vec::with_capacity(counts.iter().sum());
        for (segment, &count) in counts.iter().enumerate() {
            let (from, to) = (&points[segment], &points[segment + 1]);
            for k in 0..count {
                let t = cubic_ease_in_out(k as f64 / count as f64);
                positions.push(self.interpolate(from, to, t, segment));
            }
        }

        info!(
            segments = counts.len(),
            target_frames = self.config.target_frames(),
            frames = positions.len(),
            "Generated camera positions"
        );
        positions
    }

    fn interpolate(&self, from: &GpsPoint, to: &GpsPoint, t: f64, segment: usize) -> CameraPosition {
        let speed = lerp(from.speed_kmh, to.speed_kmh, t);
        let (zoom, pitch) = self.camera.view_for_speed(speed);
        CameraPosition {
            latitude: lerp(from.latitude, to.latitude, t),
            longitude: lerp(from.longitude, to.longitude, t),
            bearing_deg: interpolate_bearing(from.bearing_deg, to.bearing_deg, t),
            speed_kmh: speed,
            zoom,
            pitch,
            distance_km: lerp(from.distance_km, to.distance_km, t),
            time_seconds: lerp(from.time_seconds, to.time_seconds, t),
            segment_index: segment,
        }
    }
}
