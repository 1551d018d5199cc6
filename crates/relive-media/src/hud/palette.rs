//! HUD colors.

use image::Rgb;

pub const ACCENT: Rgb<u8> = Rgb([0, 255, 136]);
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const LABEL: Rgb<u8> = Rgb([120, 120, 120]);
pub const LABEL_DIM: Rgb<u8> = Rgb([80, 80, 80]);
pub const PANEL: Rgb<u8> = Rgb([0, 0, 0]);
/// Background of frames with no imagery at all.
pub const PLACEHOLDER: Rgb<u8> = Rgb([30, 30, 30]);

/// Speed at which the gradient reaches its last color, km/h.
const GRADIENT_MAX_KMH: f64 = 80.0;

/// Five-band speed ramp: blue, cyan, green, yellow, orange to red.
pub fn speed_color(speed_kmh: f64) -> Rgb<u8> {
    let norm = (speed_kmh / GRADIENT_MAX_KMH).clamp(0.0, 1.0);
    let band = |start: f64| (norm - start) / 0.2;

    let (r, g, b) = if norm < 0.2 {
        let t = band(0.0);
        (100.0 * t, 100.0 + 155.0 * t, 255.0)
    } else if norm < 0.4 {
        let t = band(0.2);
        (100.0 - 100.0 * t, 255.0, 255.0 - 155.0 * t)
    } else if norm < 0.6 {
        let t = band(0.4);
        (255.0 * t, 255.0, 100.0 - 100.0 * t)
    } else if norm < 0.8 {
        let t = band(0.6);
        (255.0, 255.0 - 100.0 * t, 0.0)
    } else {
        let t = band(0.8);
        (255.0, 155.0 - 155.0 * t, 0.0)
    };

    Rgb([r as u8, g as u8, b as u8])
}

/// Mix `color` over `base` with opacity `alpha` in [0, 1].
pub fn blend(base: Rgb<u8>, color: Rgb<u8>, alpha: f32) -> Rgb<u8> {
    let alpha = alpha.clamp(0.0, 1.0);
    let mix = |b: u8, c: u8| (b as f32 * (1.0 - alpha) + c as f32 * alpha).round() as u8;
    Rgb([
        mix(base[0], color[0]),
        mix(base[1], color[1]),
        mix(base[2], color[2]),
    ])
}
