//! Detected stops and their street-level photos.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A sustained stationary period on the track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Stop {
    /// Index of the representative (middle) point in the track
    pub point_index: usize,
    pub latitude: f64,
    pub longitude: f64,
    /// 1-based position among accepted stops
    pub sequence_number: u32,
}

/// Street-level photo captured at a stop.
#[derive(Debug, Clone, PartialEq)]
pub struct StopPhoto {
    /// Track index of the stop this photo belongs to
    pub stop_index: usize,
    /// JPEG-encoded image
    pub image: Vec<u8>,
    pub latitude: f64,
    pub longitude: f64,
    pub sequence_number: u32,
}

impl StopPhoto {
    /// The photo as a `data:` URI suitable for embedding.
    pub fn data_uri(&self) -> String {
        format!("data:image/jpeg;base64,{}", STANDARD.encode(&self.image))
    }

    pub fn to_marker(&self) -> StopMarker {
        StopMarker {
            lat: self.latitude,
            lon: self.longitude,
            photo: self.data_uri(),
            idx: self.stop_index,
            stop_num: self.sequence_number,
        }
    }
}

/// Stop marker as embedded in the viewer document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StopMarker {
    pub lat: f64,
    pub lon: f64,
    pub photo: String,
    pub idx: usize,
    pub stop_num: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_carries_data_uri() {
        let photo = StopPhoto {
            stop_index: 42,
            image: vec![0xFF, 0xD8, 0xFF],
            latitude: 25.03,
            longitude: 121.56,
            sequence_number: 2,
        };

        let marker = photo.to_marker();
        assert_eq!(marker.idx, 42);
        assert_eq!(marker.stop_num, 2);
        assert_eq!(marker.photo, "data:image/jpeg;base64,/9j/");

        let json = serde_json::to_value(&marker).unwrap();
        assert!(json.get("stop_num").is_some());
        assert!(json.get("idx").is_some());
    }
}
