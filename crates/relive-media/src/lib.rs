//! Frame composition and video encoding for Relive.
//!
//! This crate provides:
//! - Quantized map tile keys, the [`TileSource`] seam and a bounded tile cache
//! - HUD drawing (stats panel, clock, progress bar, marker) with a built-in bitmap font
//! - Stop photo insets
//! - The frame rendering loop with per-frame fallback
//! - Streaming FFmpeg encoding of raw RGB frames via the [`FrameSink`] seam

pub mod command;
pub mod error;
pub mod hud;
pub mod overlay;
pub mod progress;
pub mod renderer;
pub mod sink;
pub mod tiles;

pub use command::{check_ffmpeg, FfmpegCommand, FfmpegEncoder};
pub use error::{MediaError, MediaResult};
pub use hud::{Hud, HudFrame};
pub use overlay::{OverlayPhoto, StopPhotoOverlay};
pub use progress::{FfmpegProgress, RenderProgress, RenderProgressCallback};
pub use renderer::{FrameRenderer, RenderConfig, RenderStats};
pub use sink::{FrameCollector, FrameSink};
pub use tiles::{TileCache, TileKey, TileSource};
