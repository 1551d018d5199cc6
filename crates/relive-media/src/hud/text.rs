//! Text drawing with the bundled DejaVu Sans faces.

use std::sync::OnceLock;

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use rusttype::{Font, Scale};
use tracing::warn;

static REGULAR_TTF: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");
static BOLD_TTF: &[u8] = include_bytes!("../../assets/DejaVuSans-Bold.ttf");

/// Font weight of a HUD label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Regular,
    Bold,
}

impl Face {
    fn font(self) -> Option<&'static Font<'static>> {
        static REGULAR: OnceLock<Option<Font<'static>>> = OnceLock::new();
        static BOLD: OnceLock<Option<Font<'static>>> = OnceLock::new();

        let (cell, bytes) = match self {
            Face::Regular => (&REGULAR, REGULAR_TTF),
            Face::Bold => (&BOLD, BOLD_TTF),
        };
        cell.get_or_init(|| {
            let font = Font::try_from_bytes(bytes);
            if font.is_none() {
                warn!(face = ?self, "Bundled font failed to parse, HUD text disabled");
            }
            font
        })
        .as_ref()
    }
}

/// Draw `text` with its top-left corner at (`x`, `y`), `size` pixels tall.
///
/// Glyphs outside the image are clipped.
pub fn draw_text(image: &mut RgbImage, text: &str, x: i32, y: i32, size: f32, face: Face, color: Rgb<u8>) {
    if let Some(font) = face.font() {
        draw_text_mut(image, color, x, y, Scale::uniform(size), font, text);
    }
}

/// Rendered width of `text` in pixels.
pub fn text_width(text: &str, size: f32, face: Face) -> u32 {
    face.font()
        .map(|font| text_size(Scale::uniform(size), font, text).0.max(0) as u32)
        .unwrap_or(0)
}

/// Height of one line of text, ascent to descent.
pub fn line_height(size: f32, face: Face) -> u32 {
    face.font()
        .map(|font| {
            let metrics = font.v_metrics(Scale::uniform(size));
            (metrics.ascent - metrics.descent).ceil().max(0.0) as u32
        })
        .unwrap_or(0)
}
