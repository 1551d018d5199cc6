//! Stop detection.
//!
//! A stop is a run of consecutive slow points lasting long enough, placed at
//! the middle of the run. Stops too close to the previously accepted one are
//! dropped, so waiting at one place with GPS jitter yields a single stop.
//!
//! Speeds are smoothed before detection, so a dwell loses a few points at
//! each end to the surrounding traffic. Those edge points are timed by
//! distance over speed rather than the stationary step, which makes a dwell
//! next to fast driving measure shorter than it was.

use relive_models::{Stop, Track};
use tracing::{debug, info};

use crate::config::StopConfig;
use crate::geo::haversine_distance;

/// Finds sustained stationary periods on a track.
#[derive(Debug, Clone, Default)]
pub struct StopDetector {
    config: StopConfig,
}

/// A maximal run of points sharing the same stopped/moving state.
#[derive(Debug, Clone, Copy)]
struct Run {
    start: usize,
    len: usize,
    stopped: bool,
    duration_seconds: f64,
}

impl StopDetector {
    pub fn new(config: StopConfig) -> Self {
        Self { config }
    }

    /// Detect stops in track order.
    pub fn detect(&self, track: &Track) -> Vec<Stop> {
        if !self.config.enabled || track.len() < 2 {
            return Vec::new();
        }

        let points = track.points();
        let times = point_times(track);
        let runs = self.runs(track, &times);

        let mut stops: Vec<Stop> = Vec::new();
        let mut candidates = 0usize;

        for run in runs
            .iter()
            .filter(|r| r.stopped && r.duration_seconds >= self.config.min_duration_seconds)
        {
            candidates += 1;
            let index = run.start + run.len / 2;
            let point = &points[index];

            if let Some(previous) = stops.last() {
                let distance = haversine_distance(
                    previous.latitude,
                    previous.longitude,
                    point.latitude,
                    point.longitude,
                );
                if distance < self.config.min_distance_m {
                    debug!(
                        index,
                        distance_m = distance,
                        "Skipping stop too close to the previous one"
                    );
                    continue;
                }
            }

            stops.push(Stop {
                point_index: index,
                latitude: point.latitude,
                longitude: point.longitude,
                sequence_number: stops.len() as u32 + 1,
            });
        }

        info!(candidates, stops = stops.len(), "Stop detection finished");
        stops
    }

    /// Run-length encode the stopped flag, summing each member's time delta.
    fn runs(&self, track: &Track, times: &[f64]) -> Vec<Run> {
        let mut runs: Vec<Run> = Vec::new();

        for (i, point) in track.points().iter().enumerate() {
            let stopped = point.speed_kmh <= self.config.speed_threshold_kmh;
            let delta = if i == 0 { 0.0 } else { (times[i] - times[i - 1]).max(0.0) };

            match runs.last_mut() {
                Some(run) if run.stopped == stopped => {
                    run.len += 1;
                    run.duration_seconds += delta;
                }
                _ => runs.push(Run {
                    start: i,
                    len: 1,
                    stopped,
                    duration_seconds: delta,
                }),
            }
        }

        runs
    }
}

/// Seconds since the start for every point: recorded timestamps when all
/// points carry one, otherwise the processed elapsed time.
fn point_times(track: &Track) -> Vec<f64> {
    let points = track.points();
    match points.first().and_then(|p| p.timestamp) {
        Some(first) if track.has_timestamps() => points
            .iter()
            .map(|p| {
                p.timestamp
                    .map(|t| (t - first).num_milliseconds() as f64 / 1000.0)
                    .unwrap_or(0.0)
            })
            .collect(),
        _ => points.iter().map(|p| p.time_seconds).collect(),
    }
}
