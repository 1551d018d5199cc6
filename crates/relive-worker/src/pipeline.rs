//! Route-to-video pipeline orchestration.
//!
//! Stages run sequentially: load and process the route, detect stops,
//! capture stop photos, allocate frames, write the viewer document, then
//! render and encode. Progress is reported at fixed checkpoints
//! (5, 15, 25, 35, 50, 65, 75) and mapped onto 75-99 while rendering.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use relive_media::{
    FfmpegEncoder, FrameRenderer, FrameSink, MediaError, MediaResult, RenderProgress,
    RenderProgressCallback, RenderStats, TileSource,
};
use relive_models::{CameraPosition, Stop, StopPhoto, Track, VideoSettings};
use relive_providers::PhotoProvider;
use relive_route::{
    load_csv, CameraModel, FrameAllocator, RoadMatcher, RouteProcessor, StopDetector,
};
use serde::Serialize;
use tracing::Instrument;

use crate::config::{RunConfig, WorkerConfig};
use crate::error::WorkerResult;
use crate::logging::RunLogger;
use crate::metrics::{self, MeteredMatcher, StageTimer};
use crate::photos::capture_stop_photos;
use crate::progress::ProgressEmitter;
use crate::viewer::write_viewer;

/// External collaborators of a run.
#[derive(Clone)]
pub struct Providers {
    /// Road snapping; `None` keeps the recorded coordinates
    pub matcher: Option<Arc<dyn RoadMatcher>>,
    pub tiles: Arc<dyn TileSource>,
    /// Stop photos; `None` skips capture
    pub photos: Option<Arc<dyn PhotoProvider>>,
}

/// Everything computed before rendering starts.
#[derive(Debug, Clone)]
pub struct PreparedRoute {
    pub track: Track,
    pub stops: Vec<Stop>,
    pub photos: Vec<StopPhoto>,
    pub positions: Vec<CameraPosition>,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub video_path: PathBuf,
    pub viewer_path: PathBuf,
    pub points: usize,
    pub stops: usize,
    pub photos: usize,
    pub frames: usize,
    pub substituted_frames: usize,
    pub distance_km: f64,
    pub elapsed_secs: f64,
}

/// One configured pipeline run.
pub struct Pipeline<W: Write + Send + 'static> {
    config: RunConfig,
    worker: WorkerConfig,
    providers: Providers,
    progress: Arc<ProgressEmitter<W>>,
    logger: RunLogger,
}

impl<W: Write + Send + 'static> Pipeline<W> {
    pub fn new(
        config: RunConfig,
        worker: WorkerConfig,
        providers: Providers,
        progress: Arc<ProgressEmitter<W>>,
    ) -> Self {
        Self {
            config,
            worker,
            providers,
            progress,
            logger: RunLogger::new("pipeline"),
        }
    }

    pub fn run_id(&self) -> &str {
        self.logger.run_id()
    }

    /// Run the whole pipeline, encoding with FFmpeg.
    pub async fn run(&self, input: &Path) -> WorkerResult<RunSummary> {
        let timeout = self.worker.encoder_timeout.as_secs();
        self.run_with_sink(input, |settings, output| {
            Ok(FfmpegEncoder::spawn(settings, output)?.with_timeout(timeout))
        })
        .await
    }

    /// Run the whole pipeline, encoding into the sink `open_sink` returns.
    ///
    /// The sink is opened only once there is at least one frame to render.
    /// Any error is reported on the progress channel before it is returned.
    pub async fn run_with_sink<S, F>(&self, input: &Path, open_sink: F) -> WorkerResult<RunSummary>
    where
        S: FrameSink,
        F: FnOnce(&VideoSettings, &Path) -> MediaResult<S>,
    {
        let started = Instant::now();
        self.logger.log_start(&format!("input {}", input.display()));

        let result = self
            .execute(input, open_sink, started)
            .instrument(self.logger.create_span())
            .await;
        match result {
            Ok(summary) => {
                metrics::record_run("success", summary.elapsed_secs);
                self.progress.success("Video generated successfully!");
                self.logger.log_completion(&format!(
                    "{} frames in {:.1}s",
                    summary.frames, summary.elapsed_secs
                ));
                Ok(summary)
            }
            Err(e) => {
                metrics::record_run("error", started.elapsed().as_secs_f64());
                self.progress.error(&e.to_string());
                self.logger.log_error(&e.to_string());
                Err(e)
            }
        }
    }

    async fn execute<S, F>(&self, input: &Path, open_sink: F, started: Instant) -> WorkerResult<RunSummary>
    where
        S: FrameSink,
        F: FnOnce(&VideoSettings, &Path) -> MediaResult<S>,
    {
        let prepared = self.prepare(input).await?;

        self.progress
            .step(65, "Viewer Generation", "Generating visualization...");
        let viewer_path = self.worker.viewer_path();
        write_viewer(&viewer_path, &prepared.track, &prepared.photos)?;

        if prepared.positions.is_empty() {
            return Err(MediaError::NoFrames.into());
        }

        let video_path = self.worker.video_path();
        std::fs::create_dir_all(&self.worker.output_dir)?;
        let mut sink = open_sink(&self.config.video_settings(), &video_path)?;
        let stats = self.render(&prepared, &mut sink).await?;

        Ok(RunSummary {
            run_id: self.run_id().to_string(),
            video_path,
            viewer_path,
            points: prepared.track.len(),
            stops: prepared.stops.len(),
            photos: prepared.photos.len(),
            frames: stats.frames,
            substituted_frames: stats.substituted,
            distance_km: prepared.track.total_distance_km(),
            elapsed_secs: started.elapsed().as_secs_f64(),
        })
    }

    /// Load, process and analyse the route up to the camera path.
    pub async fn prepare(&self, input: &Path) -> WorkerResult<PreparedRoute> {
        let pipeline = &self.config.pipeline;

        self.progress.step(5, "Loading Data", "Loading GPS data...");
        let timer = StageTimer::start("load");
        let raw = load_csv(input)?;
        timer.finish();

        let matcher = self
            .providers
            .matcher
            .as_ref()
            .filter(|_| pipeline.matching.enabled)
            .map(|m| MeteredMatcher::new(Arc::clone(m)));
        if matcher.is_some() {
            self.progress
                .step(15, "Map Matching", "Matching GPS to roads...");
        }

        let timer = StageTimer::start("process");
        let processor = RouteProcessor::new(pipeline.route.clone(), pipeline.matching.clone());
        let track = processor
            .process(raw, matcher.as_ref().map(|m| m as &dyn RoadMatcher))
            .await?;
        timer.finish();
        metrics::set_track_points(track.len());

        let mut stops = Vec::new();
        let mut photos = Vec::new();
        if pipeline.stops.enabled {
            self.progress
                .step(25, "Stop Detection", "Detecting stops...");
            let logger = self.logger.for_stage("stops");
            stops = StopDetector::new(pipeline.stops.clone()).detect(&track);
            metrics::set_stops_detected(stops.len());
            logger.log_progress(&format!("{} stops detected", stops.len()));

            match &self.providers.photos {
                Some(provider) if !stops.is_empty() => {
                    self.progress
                        .step(35, "Capturing Photos", "Capturing street view photos...");
                    let timer = StageTimer::start("photos");
                    photos = capture_stop_photos(
                        provider.as_ref(),
                        &track,
                        &stops,
                        pipeline.stops.max_photos,
                        self.worker.photo_workers,
                    )
                    .await;
                    timer.finish();
                }
                None if !stops.is_empty() => {
                    logger.log_warning("No photo provider configured, skipping stop photos");
                }
                _ => {}
            }
        }

        self.progress
            .step(50, "Frame Generation", "Generating adaptive frames...");
        let timer = StageTimer::start("frames");
        let allocator = FrameAllocator::new(
            pipeline.frames.clone(),
            CameraModel::new(pipeline.camera.clone()),
        );
        let positions = allocator.generate(&track);
        timer.finish();
        self.logger.for_stage("frames").log_progress(&format!(
            "{} camera positions for {} points",
            positions.len(),
            track.len()
        ));

        Ok(PreparedRoute {
            track,
            stops,
            photos,
            positions,
        })
    }

    /// Render a prepared route into `sink` and finish it.
    pub async fn render(&self, prepared: &PreparedRoute, sink: &mut dyn FrameSink) -> WorkerResult<RenderStats> {
        self.progress.rendering_started("Rendering video frames...");

        let progress = Arc::clone(&self.progress);
        let callback: RenderProgressCallback = Arc::new(move |p: RenderProgress| {
            progress.rendering(p.frame, p.total);
        });

        let timer = StageTimer::start("render");
        let mut renderer = FrameRenderer::new(
            self.config.video_settings(),
            &self.config.render,
            Arc::clone(&self.providers.tiles),
            &prepared.photos,
        );
        let stats = renderer
            .render(&prepared.positions, sink, Some(callback))
            .await?;
        timer.finish();
        metrics::record_render(&stats);

        if stats.substituted > 0 {
            self.logger.for_stage("render").log_warning(&format!(
                "{} of {} frames substituted",
                stats.substituted, stats.frames
            ));
        }
        Ok(stats)
    }
}
