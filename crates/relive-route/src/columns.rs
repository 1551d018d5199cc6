//! Input column resolution.
//!
//! Exports from different GPS loggers label their columns differently
//! ("Latitude", "lat", "緯度"...). Each header is matched by case-insensitive
//! substring against the keyword lists below.

use crate::error::{RouteError, RouteResult};

const LATITUDE_KEYWORDS: &[&str] = &["latitude", "lat", "緯度"];
const LONGITUDE_KEYWORDS: &[&str] = &["longitude", "long", "lng", "經度"];
const SPEED_KEYWORDS: &[&str] = &["speed", "時速"];
const TIMESTAMP_KEYWORDS: &[&str] = &["timestamp", "time", "date"];

/// Column positions of the fields the pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    pub latitude: usize,
    pub longitude: usize,
    pub speed: Option<usize>,
    pub timestamp: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Latitude,
    Longitude,
    Speed,
    Timestamp,
}

fn classify(header: &str) -> Option<ColumnKind> {
    let lower = header.trim().to_lowercase();
    let matches = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

    // Order matters: "latitude" must not fall through to the timestamp
    // keywords, and "long" is only tried once "lat" has not matched.
    if matches(LATITUDE_KEYWORDS) {
        Some(ColumnKind::Latitude)
    } else if matches(LONGITUDE_KEYWORDS) {
        Some(ColumnKind::Longitude)
    } else if matches(SPEED_KEYWORDS) {
        Some(ColumnKind::Speed)
    } else if matches(TIMESTAMP_KEYWORDS) {
        Some(ColumnKind::Timestamp)
    } else {
        None
    }
}

/// Resolve header names to column positions.
///
/// When several headers match the same field, the last one wins.
/// Fails with [`RouteError::ColumnNotFound`] when latitude or longitude is
/// missing.
pub fn resolve_columns<S: AsRef<str>>(headers: &[S]) -> RouteResult<ColumnMapping> {
    let mut latitude = None;
    let mut longitude = None;
    let mut speed = None;
    let mut timestamp = None;

    for (index, header) in headers.iter().enumerate() {
        match classify(header.as_ref()) {
            Some(ColumnKind::Latitude) => latitude = Some(index),
            Some(ColumnKind::Longitude) => longitude = Some(index),
            Some(ColumnKind::Speed) => speed = Some(index),
            Some(ColumnKind::Timestamp) => timestamp = Some(index),
            None => {}
        }
    }

    Ok(ColumnMapping {
        latitude: latitude.ok_or_else(|| RouteError::column_not_found("latitude"))?,
        longitude: longitude.ok_or_else(|| RouteError::column_not_found("longitude"))?,
        speed,
        timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_headers() {
        let mapping = resolve_columns(&["Timestamp", "Latitude", "Longitude", "Speed"]).unwrap();
        assert_eq!(
            mapping,
            ColumnMapping {
                latitude: 1,
                longitude: 2,
                speed: Some(3),
                timestamp: Some(0),
            }
        );
    }

    #[test]
    fn test_short_and_cjk_headers() {
        let mapping = resolve_columns(&["緯度", "經度", "時速"]).unwrap();
        assert_eq!(mapping.latitude, 0);
        assert_eq!(mapping.longitude, 1);
        assert_eq!(mapping.speed, Some(2));
        assert_eq!(mapping.timestamp, None);

        let mapping = resolve_columns(&["LAT", "LNG"]).unwrap();
        assert_eq!((mapping.latitude, mapping.longitude), (0, 1));
    }

    #[test]
    fn test_latitude_wins_over_timestamp_keywords() {
        // "lat_updated" also contains "date"; "lon" matches nothing
        let mapping = resolve_columns(&["lat_updated", "lon", "long"]).unwrap();
        assert_eq!(mapping.latitude, 0);
        assert_eq!(mapping.longitude, 2);
    }

    #[test]
    fn test_later_duplicate_overwrites() {
        let mapping = resolve_columns(&["lat", "lat2", "lng", "speed", "gps speed"]).unwrap();
        assert_eq!(mapping.latitude, 1);
        assert_eq!(mapping.speed, Some(4));
    }

    #[test]
    fn test_missing_columns() {
        let err = resolve_columns(&["lng", "speed"]).unwrap_err();
        assert!(matches!(err, RouteError::ColumnNotFound(ref k) if k == "latitude"));

        let err = resolve_columns(&["latitude", "speed"]).unwrap_err();
        assert!(matches!(err, RouteError::ColumnNotFound(ref k) if k == "longitude"));
        assert!(err.is_input_error());
    }
}
