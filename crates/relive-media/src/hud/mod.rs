//! Heads-up display drawn over every map frame.
//!
//! Layout is defined for a 1400x1050 frame and scaled proportionally to
//! the actual frame width.

pub mod palette;
pub mod text;

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;
use relive_models::{format_time, CameraPosition};

use self::text::{draw_text, text_width, Face};
use self::palette::{blend, speed_color, ACCENT, LABEL, LABEL_DIM, PANEL, WHITE};

const REFERENCE_WIDTH: f32 = 1400.0;
const PANEL_ALPHA: f32 = 0.86;
const BAR_ALPHA: f32 = 0.7;

/// Values shown on one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HudFrame {
    pub speed_kmh: f64,
    pub distance_km: f64,
    pub time_seconds: f64,
    /// Share of the video already played, [0, 1]
    pub progress: f64,
}

impl HudFrame {
    pub fn new(position: &CameraPosition, frame_index: usize, total_frames: usize) -> Self {
        let progress = if total_frames == 0 {
            0.0
        } else {
            frame_index as f64 / total_frames as f64
        };
        Self {
            speed_kmh: position.speed_kmh,
            distance_km: position.distance_km,
            time_seconds: position.time_seconds,
            progress: progress.clamp(0.0, 1.0),
        }
    }
}

/// Draws the stats panel, clock, progress bar and position marker.
#[derive(Debug, Clone)]
pub struct Hud {
    width: u32,
    height: u32,
    scale: f32,
}

impl Hud {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            scale: width as f32 / REFERENCE_WIDTH,
        }
    }

    fn px(&self, v: f32) -> i32 {
        (v * self.scale).round() as i32
    }

    fn font_size(&self, v: f32) -> f32 {
        (v * self.scale).max(1.0)
    }

    pub fn draw(&self, image: &mut RgbImage, frame: &HudFrame) {
        self.draw_stats_panel(image, frame);
        self.draw_clock(image, frame.time_seconds);
        self.draw_progress_bar(image, frame.progress);
        self.draw_marker(image);
    }

    fn draw_stats_panel(&self, image: &mut RgbImage, frame: &HudFrame) {
        fill_translucent(
            image,
            self.px(30.0),
            self.px(30.0),
            self.px(350.0).max(1) as u32,
            self.px(250.0).max(1) as u32,
            PANEL,
            PANEL_ALPHA,
        );

        let speed = format!("{}", frame.speed_kmh.max(0.0) as u32);
        draw_text(
            image,
            &speed,
            self.px(55.0),
            self.px(55.0),
            self.font_size(70.0),
            Face::Bold,
            speed_color(frame.speed_kmh),
        );
        let small = self.font_size(24.0);
        draw_text(image, "km/h", self.px(55.0), self.px(135.0), small, Face::Regular, LABEL);

        draw_text(image, "DISTANCE", self.px(55.0), self.px(180.0), small, Face::Regular, LABEL_DIM);
        let distance = format!("{:.1} km", frame.distance_km.max(0.0));
        draw_text(
            image,
            &distance,
            self.px(55.0),
            self.px(205.0),
            self.font_size(32.0),
            Face::Regular,
            WHITE,
        );
    }

    fn draw_clock(&self, image: &mut RgbImage, time_seconds: f64) {
        let text = format_time(time_seconds);
        let size = self.font_size(40.0);
        let x = self.width as i32 - self.px(30.0) - text_width(&text, size, Face::Bold) as i32;
        draw_text(image, &text, x, self.px(40.0), size, Face::Bold, ACCENT);
    }

    fn draw_progress_bar(&self, image: &mut RgbImage, progress: f64) {
        let bar_y = self.height as i32 - self.px(60.0);
        let margin = self.px(30.0);
        let track_width = (self.width as i32 - 2 * margin).max(1) as u32;
        fill_translucent(
            image,
            margin,
            bar_y,
            track_width,
            self.px(20.0).max(1) as u32,
            PANEL,
            BAR_ALPHA,
        );

        let inner = (self.width as i32 - self.px(80.0)).max(0) as f64;
        let fill = (inner * progress.clamp(0.0, 1.0)) as u32;
        if fill > 0 {
            let rect = Rect::at(self.px(40.0), bar_y + self.px(5.0)).of_size(fill, self.px(10.0).max(1) as u32);
            draw_filled_rect_mut(image, rect, ACCENT);
        }
    }

    fn draw_marker(&self, image: &mut RgbImage) {
        let center = (self.width as i32 / 2, self.height as i32 / 2);
        draw_filled_circle_mut(image, center, self.px(20.0).max(3), WHITE);
        draw_filled_circle_mut(image, center, self.px(15.0).max(2), ACCENT);
        draw_filled_circle_mut(image, center, self.px(12.0).max(1), WHITE);
    }
}

/// Darken or tint a rectangle, clipped to the image.
pub fn fill_translucent(
    image: &mut RgbImage,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    color: Rgb<u8>,
    alpha: f32,
) {
    let x0 = x.max(0) as u32;
    let y0 = y.max(0) as u32;
    let x1 = ((x as i64 + width as i64).max(0) as u32).min(image.width());
    let y1 = ((y as i64 + height as i64).max(0) as u32).min(image.height());

    for py in y0..y1 {
        for px in x0..x1 {
            let pixel = image.get_pixel_mut(px, py);
            *pixel = blend(*pixel, color, alpha);
        }
    }
}
