//! Viewer document written next to the video.

use std::path::Path;

use relive_models::{StopPhoto, Track, ViewerPayload};
use tracing::info;

use crate::error::WorkerResult;

/// Write the trail, stop markers and totals as `viewer.json`.
pub fn write_viewer(path: impl AsRef<Path>, track: &Track, photos: &[StopPhoto]) -> WorkerResult<ViewerPayload> {
    let path = path.as_ref();
    let payload = ViewerPayload::new(track, photos);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_vec(&payload)?)?;

    info!(
        path = %path.display(),
        points = payload.total_points,
        stops = payload.stops.len(),
        "Viewer document written"
    );
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use relive_models::GpsPoint;

    #[test]
    fn test_writes_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("viewer.json");
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
                latitude: 25.001,
                longitude: 121.001,
                speed_kmh: 30.0,
                bearing_deg: 40.0,
                distance_km: 0.15,
                time_seconds: 18.0,
                timestamp: None,
            },
        ]);
        let photos = vec![StopPhoto {
            stop_index: 1,
            image: vec![0xFF, 0xD8, 0xFF],
            latitude: 25.001,
            longitude: 121.001,
            sequence_number: 1,
        }];

        write_viewer(&path, &track, &photos).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(json["trail"][1][0], 121.001);
        assert_eq!(json["trail"][1][1], 25.001);
        assert_eq!(json["stops"][0]["stop_num"], 1);
        assert_eq!(json["stops"][0]["idx"], 1);
        assert_eq!(json["stops"][0]["photo"], "data:image/jpeg;base64,/9j/");
        assert_eq!(json["total_points"], 2);
    }
}
