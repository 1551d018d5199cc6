//! GPS points and the processed track.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A row as parsed from the input table, before any processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RawPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Recorded speed in km/h, when the input carries a speed column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_kmh: Option<f64>,
    /// Recorded wall-clock time, when the input carries a timestamp column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl RawPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            speed_kmh: None,
            timestamp: None,
        }
    }

    pub fn with_speed(mut self, speed_kmh: f64) -> Self {
        self.speed_kmh = Some(speed_kmh);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// One point of the augmented track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Smoothed speed in km/h (never negative)
    pub speed_kmh: f64,
    /// Smoothed heading in degrees, [0, 360)
    pub bearing_deg: f64,
    /// Cumulative distance from the first point in km
    pub distance_km: f64,
    /// Cumulative elapsed time from the first point in seconds
    pub time_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Ordered sequence of processed GPS points.
///
/// Produced once by the route processor; later stages only read it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Track {
    points: Vec<GpsPoint>,
}

impl Track {
    pub fn new(points: Vec<GpsPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[GpsPoint] {
        &self.points
    }

    pub fn get(&self, index: usize) -> Option<&GpsPoint> {
        self.points.get(index)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of segments between consecutive points.
    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    pub fn total_distance_km(&self) -> f64 {
        self.points.last().map(|p| p.distance_km).unwrap_or(0.0)
    }

    pub fn total_duration_seconds(&self) -> f64 {
        self.points.last().map(|p| p.time_seconds).unwrap_or(0.0)
    }

    pub fn average_speed_kmh(&self) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }
        self.points.iter().map(|p| p.speed_kmh).sum::<f64>() / self.points.len() as f64
    }

    pub fn max_speed_kmh(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.speed_kmh)
            .fold(0.0, f64::max)
    }

    /// Whether every point carries a recorded timestamp.
    pub fn has_timestamps(&self) -> bool {
        !self.points.is_empty() && self.points.iter().all(|p| p.timestamp.is_some())
    }

    /// Trail as `[lon, lat]` pairs, the order map renderers expect.
    pub fn trail_coordinates(&self) -> Vec<[f64; 2]> {
        self.points
            .iter()
            .map(|p| [p.longitude, p.latitude])
            .collect()
    }
}
