//! Camera positions, one per rendered video frame.

use serde::{Deserialize, Serialize};

/// One interpolated viewpoint along the track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub bearing_deg: f64,
    pub speed_kmh: f64,
    pub zoom: f64,
    pub pitch: f64,
    pub distance_km: f64,
    pub time_seconds: f64,
    /// Index of the track segment (start point) this frame was interpolated from
    pub segment_index: usize,
}
