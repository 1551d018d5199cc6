//! Stop photo insets.
//!
//! When the camera passes a stop that has a street-level photo, the photo
//! is shown in a corner inset for a fixed number of frames.

use image::imageops::{self, FilterType};
use image::RgbImage;
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use relive_models::StopPhoto;
use tracing::warn;

use crate::hud::text::{draw_text, line_height, Face};
use crate::hud::palette::{ACCENT, PANEL, WHITE};
use crate::hud::fill_translucent;

/// Inset width as a percentage of the frame width.
const INSET_WIDTH_PERCENT: u32 = 26;
const BORDER: u32 = 4;

/// A decoded photo ready to draw.
#[derive(Debug, Clone)]
pub struct OverlayPhoto {
    /// Track index of the stop
    pub stop_index: usize,
    pub sequence_number: u32,
    pub image: RgbImage,
}

/// Chooses which stop photo, if any, is shown on each frame.
#[derive(Debug, Clone)]
pub struct StopPhotoOverlay {
    photos: Vec<OverlayPhoto>,
    proximity: usize,
    display_frames: usize,
    /// Index into `photos` and frames left
    active: Option<(usize, usize)>,
    last_shown: Option<usize>,
}

impl StopPhotoOverlay {
    /// Decode and scale photos for a `frame_width`-wide video.
    ///
    /// Photos that fail to decode are skipped.
    pub fn new(
        photos: &[StopPhoto],
        frame_width: u32,
        proximity: usize,
        display_frames: usize,
    ) -> Self {
        let inset_width = (frame_width * INSET_WIDTH_PERCENT / 100).max(1);
        let decoded = photos
            .iter()
            .filter_map(|photo| match image::load_from_memory(&photo.image) {
                Ok(img) => {
                    let img = img.to_rgb8();
                    let inset_height = (img.height() * inset_width / img.width().max(1)).max(1);
                    Some(OverlayPhoto {
                        stop_index: photo.stop_index,
                        sequence_number: photo.sequence_number,
                        image: imageops::resize(&img, inset_width, inset_height, FilterType::Triangle),
                    })
                }
                Err(e) => {
                    warn!(stop = photo.sequence_number, error = %e, "Skipping undecodable stop photo");
                    None
                }
            })
            .collect();

        Self::from_decoded(decoded, proximity, display_frames)
    }

    pub fn from_decoded(photos: Vec<OverlayPhoto>, proximity: usize, display_frames: usize) -> Self {
        Self {
            photos,
            proximity,
            display_frames,
            active: None,
            last_shown: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    /// Advance to the frame at `segment_index` and return the photo to show.
    ///
    /// A photo starts when the frame comes within `proximity` points of its
    /// stop, stays for `display_frames` frames and is not restarted until a
    /// different stop has been shown.
    pub fn advance(&mut self, segment_index: usize) -> Option<&OverlayPhoto> {
        if let Some((photo, remaining)) = self.active {
            if remaining > 0 {
                self.active = Some((photo, remaining - 1));
                return self.photos.get(photo);
            }
            self.active = None;
        }

        let candidate = self
            .photos
            .iter()
            .enumerate()
            .filter(|(_, p)| p.stop_index.abs_diff(segment_index) < self.proximity)
            .min_by_key(|(_, p)| p.stop_index.abs_diff(segment_index))
            .map(|(i, _)| i)?;

        if self.last_shown == Some(candidate) || self.display_frames == 0 {
            return None;
        }

        self.last_shown = Some(candidate);
        self.active = Some((candidate, self.display_frames - 1));
        self.photos.get(candidate)
    }
}

/// Draw `photo` as a bordered inset in the bottom-right corner.
pub fn draw_inset(image: &mut RgbImage, photo: &OverlayPhoto) {
    let (w, h) = (photo.image.width(), photo.image.height());
    let margin = (image.width() / 40).max(BORDER);
    let label_size = (image.width() as f32 / 58.0).max(8.0);
    let label_height = line_height(label_size, Face::Bold) + 2 * BORDER;

    // Leave room for the progress bar at the bottom
    let x = image.width() as i64 - margin as i64 - w as i64 - BORDER as i64;
    let y = image.height() as i64 - (image.height() / 8) as i64 - h as i64 - label_height as i64;
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as i32, y as i32);

    draw_filled_rect_mut(
        image,
        Rect::at(x - BORDER as i32, y - BORDER as i32).of_size(w + 2 * BORDER, h + 2 * BORDER),
        WHITE,
    );
    imageops::replace(image, &photo.image, x as i64, y as i64);

    fill_translucent(
        image,
        x - BORDER as i32,
        y + h as i32 + BORDER as i32,
        w + 2 * BORDER,
        label_height,
        PANEL,
        0.8,
    );
    draw_text(
        image,
        &format!("Stop #{}", photo.sequence_number),
        x,
        y + h as i32 + 2 * BORDER as i32,
        label_size,
        Face::Bold,
        ACCENT,
    );
}
