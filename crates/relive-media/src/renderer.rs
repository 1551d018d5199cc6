//! Frame rendering loop.
//!
//! Every camera position becomes exactly one frame: map imagery from the
//! tile cache, the HUD and an optional stop photo inset. A frame that cannot
//! be composed is replaced by the previous frame (or a dark placeholder) so
//! one bad tile never aborts a run.

use std::sync::Arc;
use std::time::Instant;

use image::imageops::{self, FilterType};
use image::RgbImage;
use relive_models::{CameraPosition, StopPhoto, VideoSettings};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};
use crate::hud::palette::PLACEHOLDER;
use crate::hud::{Hud, HudFrame};
use crate::overlay::{draw_inset, StopPhotoOverlay};
use crate::progress::{RenderProgress, RenderProgressCallback};
use crate::sink::FrameSink;
use crate::tiles::{TileCache, TileKey, TileSource};

/// Per-frame failures logged in full before going quiet.
const LOGGED_FAILURES: usize = 10;

/// Rendering settings beyond the output video format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Tiles kept in memory (default: 256)
    pub tile_cache_capacity: usize,

    /// A stop photo appears when the frame is within this many track points of the stop (default: 15)
    pub stop_photo_proximity: usize,

    /// How long a stop photo stays on screen (default: 3 s)
    pub stop_photo_display_seconds: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            tile_cache_capacity: 256,
            stop_photo_proximity: 15,
            stop_photo_display_seconds: 3.0,
        }
    }
}

/// Outcome of a render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub frames: usize,
    /// Frames replaced by the previous frame or a placeholder
    pub substituted: usize,
    pub tile_hits: u64,
    pub tile_misses: u64,
    pub elapsed_ms: u64,
}

/// Turns camera positions into frames and streams them into a sink.
pub struct FrameRenderer {
    settings: VideoSettings,
    tiles: Arc<dyn TileSource>,
    cache: TileCache,
    hud: Hud,
    overlay: StopPhotoOverlay,
}

impl FrameRenderer {
    pub fn new(
        settings: VideoSettings,
        config: &RenderConfig,
        tiles: Arc<dyn TileSource>,
        photos: &[StopPhoto],
    ) -> Self {
        let display_frames = (config.stop_photo_display_seconds * settings.fps as f64).round().max(0.0) as usize;
        let overlay = StopPhotoOverlay::new(
            photos,
            settings.width,
            config.stop_photo_proximity,
            display_frames,
        );
        Self {
            hud: Hud::new(settings.width, settings.height),
            cache: TileCache::new(config.tile_cache_capacity),
            settings,
            tiles,
            overlay,
        }
    }

    /// Render every position into `sink`, then finish the sink.
    ///
    /// Fails with [`MediaError::NoFrames`] before touching the sink when
    /// there is nothing to render. Sink errors abort the render.
    pub async fn render(
        &mut self,
        positions: &[CameraPosition],
        sink: &mut dyn FrameSink,
        progress: Option<RenderProgressCallback>,
    ) -> MediaResult<RenderStats> {
        if positions.is_empty() {
            return Err(MediaError::NoFrames);
        }

        let started = Instant::now();
        let total = positions.len();
        let mut previous: Option<RgbImage> = None;
        let mut substituted = 0usize;

        info!(
            frames = total,
            width = self.settings.width,
            height = self.settings.height,
            "Rendering frames"
        );

        for (index, position) in positions.iter().enumerate() {
            let frame = match self.render_frame(position, index, total).await {
                Ok(frame) => frame,
                Err(e) if e.is_frame_recoverable() => {
                    substituted += 1;
                    if substituted <= LOGGED_FAILURES {
                        warn!(frame = index, error = %e, "Frame failed, substituting");
                    }
                    previous.clone().unwrap_or_else(|| self.placeholder())
                }
                Err(e) => return Err(e),
            };

            sink.write_frame(&frame).await?;
            previous = Some(frame);

            if let Some(callback) = &progress {
                callback(RenderProgress {
                    frame: index + 1,
                    total,
                    substituted,
                });
            }
        }

        sink.finish().await?;

        let stats = RenderStats {
            frames: total,
            substituted,
            tile_hits: self.cache.hits(),
            tile_misses: self.cache.misses(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            frames = stats.frames,
            substituted = stats.substituted,
            tile_hits = stats.tile_hits,
            tile_misses = stats.tile_misses,
            elapsed_ms = stats.elapsed_ms,
            "Rendering finished"
        );
        Ok(stats)
    }

    async fn render_frame(
        &mut self,
        position: &CameraPosition,
        index: usize,
        total: usize,
    ) -> MediaResult<RgbImage> {
        let base = self.base_image(position).await?;
        let mut frame = base.as_ref().clone();

        self.hud.draw(&mut frame, &HudFrame::new(position, index, total));
        if let Some(photo) = self.overlay.advance(position.segment_index) {
            draw_inset(&mut frame, photo);
        }
        Ok(frame)
    }

    /// Map imagery for a position, scaled to the output size.
    async fn base_image(&mut self, position: &CameraPosition) -> MediaResult<Arc<RgbImage>> {
        let key = TileKey::from_camera(position);
        if let Some(tile) = self.cache.get(&key) {
            return Ok(tile);
        }

        debug!(tile = %key, "Fetching map tile");
        let tile = self.tiles.fetch_tile(&key).await?;
        let tile = if tile.dimensions() == (self.settings.width, self.settings.height) {
            tile
        } else {
            imageops::resize(&tile, self.settings.width, self.settings.height, FilterType::Triangle)
        };

        let tile = Arc::new(tile);
        self.cache.insert(key, Arc::clone(&tile));
        Ok(tile)
    }

    fn placeholder(&self) -> RgbImage {
        RgbImage::from_pixel(self.settings.width, self.settings.height, PLACEHOLDER)
    }
}
