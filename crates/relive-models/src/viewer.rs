//! Data embedded in the interactive viewer document.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::stop::{StopMarker, StopPhoto};
use crate::track::Track;

/// Everything a client-side viewer needs to replay the route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ViewerPayload {
    /// Full trail as `[lon, lat]` pairs, in track order
    pub trail: Vec<[f64; 2]>,
    /// Stops that have a captured photo, in stop order
    pub stops: Vec<StopMarker>,
    pub total_points: usize,
    pub total_distance_km: f64,
    pub total_duration_seconds: f64,
}

impl ViewerPayload {
    pub fn new(track: &Track, photos: &[StopPhoto]) -> Self {
        Self {
            trail: track.trail_coordinates(),
            stops: photos.iter().map(StopPhoto::to_marker).collect(),
            total_points: track.len(),
            total_distance_km: track.total_distance_km(),
            total_duration_seconds: track.total_duration_seconds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::GpsPoint;

    #[test]
    fn test_payload_from_track() {
        let track = Track::new(vec![
            GpsPoint {
                latitude: 25.0,
                longitude: 121.0,
                speed_kmh: 0.0,
                bearing_deg: 0.0,
                distance_km: 0.0,
                time_seconds: 0.0,
                timestamp: None,
            },
            GpsPoint {
                latitude: 25.01,
                longitude: 121.01,
                speed_kmh: 40.0,
                bearing_deg: 45.0,
                distance_km: 1.5,
                time_seconds: 120.0,
                timestamp: None,
            },
        ]);
        let photos = vec![StopPhoto {
            stop_index: 1,
            image: vec![1, 2, 3],
            latitude: 25.01,
            longitude: 121.01,
            sequence_number: 1,
        }];

        let payload = ViewerPayload::new(&track, &photos);
        assert_eq!(payload.trail, vec![[121.0, 25.0], [121.01, 25.01]]);
        assert_eq!(payload.stops.len(), 1);
        assert_eq!(payload.stops[0].idx, 1);
        assert_eq!(payload.total_points, 2);
        assert!((payload.total_distance_km - 1.5).abs() < 1e-9);
    }
}
