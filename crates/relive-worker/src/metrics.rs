//! Prometheus metrics for pipeline runs.
//!
//! The pipeline records unconditionally; a recorder is installed only when
//! `METRICS_FILE` is set.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use relive_media::RenderStats;
use relive_route::{MatchResult, RoadMatcher};

use crate::error::{WorkerError, WorkerResult};

/// Install the Prometheus recorder.
pub fn init_metrics() -> WorkerResult<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| WorkerError::config_error(format!("failed to install metrics recorder: {}", e)))
}

/// Render the current metrics to `path` in the text exposition format.
pub fn write_metrics(handle: &PrometheusHandle, path: impl AsRef<Path>) -> WorkerResult<()> {
    std::fs::write(path, handle.render())?;
    Ok(())
}

/// Metric names as constants for consistency.
pub mod names {
    // Run metrics
    pub const RUNS_TOTAL: &str = "relive_runs_total";
    pub const RUN_DURATION_SECONDS: &str = "relive_run_duration_seconds";
    pub const STAGE_DURATION_SECONDS: &str = "relive_stage_duration_seconds";

    // Route metrics
    pub const TRACK_POINTS: &str = "relive_track_points";
    pub const STOPS_DETECTED: &str = "relive_stops_detected";
    pub const MATCH_BATCHES_TOTAL: &str = "relive_match_batches_total";

    // Photo metrics
    pub const PHOTOS_TOTAL: &str = "relive_photos_total";

    // Rendering metrics
    pub const FRAMES_RENDERED_TOTAL: &str = "relive_frames_rendered_total";
    pub const FRAMES_SUBSTITUTED_TOTAL: &str = "relive_frames_substituted_total";
    pub const TILE_CACHE_HITS_TOTAL: &str = "relive_tile_cache_hits_total";
    pub const TILE_CACHE_MISSES_TOTAL: &str = "relive_tile_cache_misses_total";
}

/// Record a finished run.
pub fn record_run(outcome: &str, duration_secs: f64) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::RUNS_TOTAL, &labels).increment(1);
    histogram!(names::RUN_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record how long a pipeline stage took.
pub fn record_stage_duration(stage: &str, duration_secs: f64) {
    let labels = [("stage", stage.to_string())];
    histogram!(names::STAGE_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn set_track_points(points: usize) {
    gauge!(names::TRACK_POINTS).set(points as f64);
}

pub fn set_stops_detected(stops: usize) {
    gauge!(names::STOPS_DETECTED).set(stops as f64);
}

/// Record one road matching batch.
pub fn record_match_batch(matched: bool) {
    let labels = [("outcome", if matched { "matched" } else { "passthrough" }.to_string())];
    counter!(names::MATCH_BATCHES_TOTAL, &labels).increment(1);
}

/// Record one stop photo attempt.
pub fn record_photo(captured: bool) {
    let labels = [("outcome", if captured { "captured" } else { "missing" }.to_string())];
    counter!(names::PHOTOS_TOTAL, &labels).increment(1);
}

/// Record the outcome of a render.
pub fn record_render(stats: &RenderStats) {
    counter!(names::FRAMES_RENDERED_TOTAL).increment(stats.frames as u64);
    counter!(names::FRAMES_SUBSTITUTED_TOTAL).increment(stats.substituted as u64);
    counter!(names::TILE_CACHE_HITS_TOTAL).increment(stats.tile_hits);
    counter!(names::TILE_CACHE_MISSES_TOTAL).increment(stats.tile_misses);
}

/// Measures a stage from creation to [`StageTimer::finish`].
pub struct StageTimer {
    stage: &'static str,
    started: Instant,
}

impl StageTimer {
    pub fn start(stage: &'static str) -> Self {
        Self {
            stage,
            started: Instant::now(),
        }
    }

    /// Record the duration and return it in seconds.
    pub fn finish(self) -> f64 {
        let secs = self.started.elapsed().as_secs_f64();
        record_stage_duration(self.stage, secs);
        secs
    }
}

/// [`RoadMatcher`] wrapper counting matched and failed batches.
pub struct MeteredMatcher {
    inner: Arc<dyn RoadMatcher>,
}

impl MeteredMatcher {
    pub fn new(inner: Arc<dyn RoadMatcher>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl RoadMatcher for MeteredMatcher {
    async fn match_batch(&self, coordinates: &[[f64; 2]]) -> MatchResult<Vec<[f64; 2]>> {
        let result = self.inner.match_batch(coordinates).await;
        record_match_batch(matches!(&result, Ok(c) if !c.is_empty()));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relive_route::MatchError;

    struct Echo;

    #[async_trait]
    impl RoadMatcher for Echo {
        async fn match_batch(&self, coordinates: &[[f64; 2]]) -> MatchResult<Vec<[f64; 2]>> {
            if coordinates.len() > 2 {
                return Err(MatchError::InvalidBatch(coordinates.len()));
            }
            Ok(coordinates.to_vec())
        }
    }

    #[tokio::test]
    async fn test_metered_matcher_passes_results_through() {
        let matcher = MeteredMatcher::new(Arc::new(Echo));
        let batch = [[121.0, 25.0], [121.001, 25.0]];
        assert_eq!(matcher.match_batch(&batch).await.unwrap(), batch.to_vec());
        assert!(matcher.match_batch(&[[0.0, 0.0]; 3]).await.is_err());
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_run("success", 1.5);
        record_render(&RenderStats::default());
        assert!(StageTimer::start("loading").finish() >= 0.0);
    }
}
