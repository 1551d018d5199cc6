//! Core route algorithms for the Relive pipeline.
//!
//! This crate provides:
//! - Great-circle geometry, bearing math and easing
//! - Gaussian and moving-average smoothing
//! - Input column resolution and CSV loading with bounding-box cleaning
//! - Best-effort road snapping through the [`RoadMatcher`] seam
//! - Route processing into a [`relive_models::Track`]
//! - Stop detection with spatial deduplication
//! - Speed-driven camera model and importance-weighted frame allocation

pub mod camera;
pub mod columns;
pub mod config;
pub mod error;
pub mod frames;
pub mod geo;
pub mod loader;
pub mod matcher;
pub mod processor;
pub mod smoothing;
pub mod stops;

pub use camera::CameraModel;
pub use columns::{resolve_columns, ColumnMapping};
pub use config::{
    BoundingBox, CameraConfig, FrameConfig, MatchingConfig, PipelineConfig, RouteConfig,
    StopConfig,
};
pub use error::{RouteError, RouteResult};
pub use frames::FrameAllocator;
pub use loader::{clean_points, load_csv, read_points};
pub use matcher::{snap_to_roads, MatchError, MatchResult, RoadMatcher, SnappedTrace};
pub use processor::RouteProcessor;
pub use smoothing::SmoothingStrategy;
pub use stops::StopDetector;
