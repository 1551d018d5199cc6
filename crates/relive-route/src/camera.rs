//! Speed-driven camera zoom and pitch.
//!
//! Slow segments get a close, steep view; fast segments pull back and
//! flatten out so more of the road ahead is visible.

use crate::config::CameraConfig;
use crate::geo::cubic_ease_in_out;

const SLOW_KMH: f64 = 20.0;
const FAST_KMH: f64 = 60.0;
const FAST_RAMP_KMH: f64 = 40.0;

/// Maps a speed to a `(zoom, pitch)` pair.
#[derive(Debug, Clone, Default)]
pub struct CameraModel {
    config: CameraConfig,
}

impl CameraModel {
    pub fn new(config: CameraConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Zoom and pitch for a speed in km/h.
    pub fn view_for_speed(&self, speed_kmh: f64) -> (f64, f64) {
        let c = &self.config;
        if !c.dynamic {
            return (c.zoom_base, c.pitch_base);
        }

        let speed = speed_kmh.max(0.0);
        if speed < SLOW_KMH {
            let t = speed / SLOW_KMH;
            let zoom = c.zoom_max - (c.zoom_max - c.zoom_base) * t * 0.5;
            (zoom, c.pitch_max)
        } else if speed > FAST_KMH {
            let t = ((speed - FAST_KMH) / FAST_RAMP_KMH).min(1.0);
            let zoom = c.zoom_base - (c.zoom_base - c.zoom_min) * t;
            let pitch = c.pitch_base - (c.pitch_base - c.pitch_min) * t;
            (zoom, pitch)
        } else {
            let t = cubic_ease_in_out((speed - SLOW_KMH) / (FAST_KMH - SLOW_KMH));
            let zoom = c.zoom_max - (c.zoom_max - c.zoom_min) * t;
            let pitch = c.pitch_max - (c.pitch_max - c.pitch_min) * t;
            (zoom, pitch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_slow_speeds_zoom_in() {
        let camera = CameraModel::default();
        let (zoom, pitch) = camera.view_for_speed(0.0);
        assert!((zoom - 18.0).abs() < EPS);
        assert!((pitch - 70.0).abs() < EPS);

        let (zoom, pitch) = camera.view_for_speed(10.0);
        assert!((zoom - 17.75).abs() < EPS);
        assert!((pitch - 70.0).abs() < EPS);
    }

    #[test]
    fn test_medium_speeds_ease() {
        let camera = CameraModel::default();
        let (zoom, pitch) = camera.view_for_speed(20.0);
        assert!((zoom - 18.0).abs() < EPS);
        assert!((pitch - 70.0).abs() < EPS);

        let (zoom, pitch) = camera.view_for_speed(40.0);
        assert!((zoom - 17.0).abs() < EPS);
        assert!((pitch - 60.0).abs() < EPS);

        let (zoom, pitch) = camera.view_for_speed(60.0);
        assert!((zoom - 16.0).abs() < EPS);
        assert!((pitch - 50.0).abs() < EPS);
    }

    #[test]
    fn test_fast_speeds_are_capped() {
        let camera = CameraModel::default();
        let (zoom, pitch) = camera.view_for_speed(80.0);
        assert!((zoom - 16.5).abs() < EPS);
        assert!((pitch - 55.0).abs() < EPS);

        let (zoom, pitch) = camera.view_for_speed(250.0);
        assert!((zoom - 16.0).abs() < EPS);
        assert!((pitch - 50.0).abs() < EPS);
    }

    #[test]
    fn test_values_stay_in_bounds() {
        let camera = CameraModel::default();
        for speed in 0..200 {
            let (zoom, pitch) = camera.view_for_speed(speed as f64);
            assert!((16.0..=18.0).contains(&zoom));
            assert!((50.0..=70.0).contains(&pitch));
        }
    }

    #[test]
    fn test_static_camera() {
        let camera = CameraModel::new(CameraConfig {
            dynamic: false,
            ..Default::default()
        });
        assert_eq!(camera.view_for_speed(5.0), (17.0, 60.0));
        assert_eq!(camera.view_for_speed(120.0), (17.0, 60.0));
    }
}
