//! Relive worker binary.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};

use relive_media::check_ffmpeg;
use relive_providers::{MapboxConfig, MapboxMatcher, PhotoProvider, StaticMapClient, StreetViewClient};
use relive_route::RoadMatcher;
use relive_worker::metrics::{init_metrics, write_metrics};
use relive_worker::{
    init_tracing, Pipeline, ProgressEmitter, Providers, RunConfig, RunSummary, WorkerConfig,
};

#[derive(Parser, Debug)]
#[command(name = "relive-worker")]
#[command(about = "Render a relive video from a GPS track", long_about = None)]
struct Cli {
    /// GPS track CSV with a header row
    input: PathBuf,

    /// JSON file overriding pipeline, render and video settings
    #[arg(short, long, env = "RELIVE_CONFIG")]
    config: Option<PathBuf>,

    /// Output directory (overrides RELIVE_OUTPUT_DIR)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Keep recorded coordinates instead of snapping to roads
    #[arg(long)]
    no_matching: bool,

    /// Skip street-level photos at stops
    #[arg(long)]
    no_photos: bool,
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    let _ = rustls::crypto::ring::default_provider().install_default();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut worker = WorkerConfig::from_env();
    if let Some(dir) = &cli.output_dir {
        worker.output_dir = dir.clone();
    }
    init_tracing(worker.log_json);
    info!("Starting relive-worker");
    info!("Worker config: {:?}", worker);

    let metrics = match &worker.metrics_file {
        Some(_) => match init_metrics() {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Metrics disabled: {}", e);
                None
            }
        },
        None => None,
    };

    let progress = Arc::new(ProgressEmitter::stdout());
    let code = match run(&cli, worker.clone(), Arc::clone(&progress)).await {
        Ok(summary) => {
            info!(
                video = %summary.video_path.display(),
                frames = summary.frames,
                stops = summary.stops,
                photos = summary.photos,
                "Run complete in {:.1}s",
                summary.elapsed_secs
            );
            0
        }
        Err(e) => {
            let message = format!("{:#}", e);
            if !progress.is_finished() {
                progress.error(&message);
            }
            error!("Run failed: {}", message);
            1
        }
    };

    if let (Some(handle), Some(path)) = (&metrics, &worker.metrics_file) {
        if let Err(e) = write_metrics(handle, path) {
            warn!("Failed to write metrics to {}: {}", path.display(), e);
        }
    }

    std::process::exit(code);
}

async fn run(
    cli: &Cli,
    worker: WorkerConfig,
    progress: Arc<ProgressEmitter<std::io::Stdout>>,
) -> anyhow::Result<RunSummary> {
    let mut config = match &cli.config {
        Some(path) => RunConfig::load(path)
            .with_context(|| format!("loading run config {}", path.display()))?,
        None => RunConfig::default(),
    };
    if cli.no_matching {
        config.pipeline.matching.enabled = false;
    }

    let ffmpeg = check_ffmpeg()?;
    info!("Using FFmpeg at {}", ffmpeg.display());

    let mapbox = MapboxConfig::from_env()?;
    let matcher: Option<Arc<dyn RoadMatcher>> = if config.pipeline.matching.enabled {
        Some(Arc::new(MapboxMatcher::new(mapbox.clone())?))
    } else {
        None
    };
    let tiles = Arc::new(StaticMapClient::new(mapbox)?);

    let photos: Option<Arc<dyn PhotoProvider>> = if cli.no_photos {
        None
    } else {
        match StreetViewClient::from_env()? {
            Some(client) => Some(Arc::new(client)),
            None => {
                warn!("GOOGLE_API_KEY not set, stop photos disabled");
                None
            }
        }
    };

    let pipeline = Pipeline::new(
        config,
        worker,
        Providers {
            matcher,
            tiles,
            photos,
        },
        progress,
    );
    info!(run_id = %pipeline.run_id(), input = %cli.input.display(), "Pipeline starting");

    Ok(pipeline.run(&cli.input).await?)
}
