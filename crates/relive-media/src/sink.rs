//! Destinations for rendered frames.

use async_trait::async_trait;
use image::RgbImage;

use crate::error::{MediaError, MediaResult};

/// Consumes rendered frames in order.
///
/// `finish` is called exactly once after the last frame; a sink may not
/// accept frames afterwards.
#[async_trait]
pub trait FrameSink: Send {
    async fn write_frame(&mut self, frame: &RgbImage) -> MediaResult<()>;

    async fn finish(&mut self) -> MediaResult<()>;
}

/// Keeps frames in memory. Useful for previews and tests.
#[derive(Debug, Default)]
pub struct FrameCollector {
    frames: Vec<RgbImage>,
    finished: bool,
}

impl FrameCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[RgbImage] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<RgbImage> {
        self.frames
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[async_trait]
impl FrameSink for FrameCollector {
    async fn write_frame(&mut self, frame: &RgbImage) -> MediaResult<()> {
        if self.finished {
            return Err(MediaError::internal("frame written after finish"));
        }
        self.frames.push(frame.clone());
        Ok(())
    }

    async fn finish(&mut self) -> MediaResult<()> {
        self.finished = true;
        Ok(())
    }
}
