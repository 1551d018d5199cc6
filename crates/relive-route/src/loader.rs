//! CSV loading and cleaning of raw GPS rows.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use relive_models::RawPoint;
use tracing::{debug, info, warn};

use crate::columns::resolve_columns;
use crate::config::BoundingBox;
use crate::error::{RouteError, RouteResult};

/// Naive timestamp layouts accepted besides RFC 3339; interpreted as UTC.
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"];

/// Load raw GPS rows from a CSV file.
pub fn load_csv(path: impl AsRef<Path>) -> RouteResult<Vec<RawPoint>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let points = read_points(file)?;
    info!(path = %path.display(), rows = points.len(), "Loaded GPS rows");
    Ok(points)
}

/// Parse raw GPS rows from any CSV source with a header row.
///
/// Rows whose latitude or longitude is missing or unparseable are skipped.
/// Unparseable speed or timestamp cells become `None`.
pub fn read_points<R: Read>(reader: R) -> RouteResult<Vec<RawPoint>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(RouteError::MissingHeader);
    }
    let headers: Vec<&str> = headers.iter().collect();
    let mapping = resolve_columns(&headers)?;
    debug!(?mapping, "Resolved input columns");

    let mut points = Vec::new();
    let mut skipped = 0usize;

    for record in reader.records() {
        let record = record?;

        let latitude = record.get(mapping.latitude).and_then(parse_number);
        let longitude = record.get(mapping.longitude).and_then(parse_number);
        let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
            skipped += 1;
            continue;
        };

        let mut point = RawPoint::new(latitude, longitude);
        point.speed_kmh = mapping
            .speed
            .and_then(|i| record.get(i))
            .and_then(parse_number);
        point.timestamp = mapping
            .timestamp
            .and_then(|i| record.get(i))
            .and_then(parse_timestamp);
        points.push(point);
    }

    if skipped > 0 {
        warn!(skipped, "Skipped rows with missing or invalid coordinates");
    }

    Ok(points)
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an RFC 3339 or naive `YYYY-MM-DD HH:MM:SS` timestamp.
pub fn parse_timestamp(cell: &str) -> Option<DateTime<Utc>> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(cell) {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(cell, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Keep rows inside the bounding box and drop repeated coordinates.
///
/// The first occurrence of each exact (lat, lon) pair is kept and the input
/// order is preserved. Fails with [`RouteError::NoValidRows`] when nothing
/// survives.
pub fn clean_points(raw: Vec<RawPoint>, bbox: &BoundingBox) -> RouteResult<Vec<RawPoint>> {
    let total = raw.len();
    let mut seen = HashSet::with_capacity(total);
    let mut outside = 0usize;
    let mut duplicates = 0usize;

    let cleaned: Vec<RawPoint> = raw
        .into_iter()
        .filter(|p| {
            if !bbox.contains(p.latitude, p.longitude) {
                outside += 1;
                return false;
            }
            if !seen.insert((p.latitude.to_bits(), p.longitude.to_bits())) {
                duplicates += 1;
                return false;
            }
            true
        })
        .collect();

    info!(
        total,
        kept = cleaned.len(),
        outside,
        duplicates,
        "Cleaned GPS rows"
    );

    if cleaned.is_empty() {
        return Err(RouteError::NoValidRows(total));
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_points_with_all_columns() {
        let csv = "time,lat,lng,speed\n\
                   2024-03-01T08:00:00Z,25.0330,121.5654,12.5\n\
                   2024-03-01 08:00:05,25.0331,121.5655,\n";
        let points = read_points(csv.as_bytes()).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].speed_kmh, Some(12.5));
        assert_eq!(points[1].speed_kmh, None);
        let delta = points[1].timestamp.unwrap() - points[0].timestamp.unwrap();
        assert_eq!(delta.num_seconds(), 5);
    }

    #[test]
    fn test_read_points_skips_bad_coordinates() {
        let csv = "latitude,longitude\n25.0,121.0\nabc,121.1\n,121.2\n25.1,121.3\n";
        let points = read_points(csv.as_bytes()).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].longitude, 121.3);
    }

    #[test]
    fn test_read_points_missing_column() {
        let csv = "latitude,speed\n25.0,10\n";
        let err = read_points(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, RouteError::ColumnNotFound(_)));
    }

    #[test]
    fn test_load_csv_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "緯度,經度,時速").unwrap();
        writeln!(file, "25.0,121.0,30").unwrap();
        writeln!(file, "25.001,121.0,31").unwrap();

        let points = load_csv(file.path()).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].speed_kmh, Some(31.0));
    }

    #[test]
    fn test_load_csv_missing_file() {
        let err = load_csv("/nonexistent/relive/input.csv").unwrap_err();
        assert!(matches!(err, RouteError::Io(_)));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-03-01T08:00:00+08:00").is_some());
        assert!(parse_timestamp("2024/03/01 08:00:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_clean_points_filters_and_dedupes() {
        let raw = vec![
            RawPoint::new(25.0, 121.0),
            RawPoint::new(35.0, 121.0),
            RawPoint::new(25.0, 121.0).with_speed(9.0),
            RawPoint::new(25.1, 121.1),
            RawPoint::new(25.0, 117.0),
        ];
        let cleaned = clean_points(raw, &BoundingBox::default()).unwrap();
        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned[0].speed_kmh, None);
        assert_eq!(cleaned[1].latitude, 25.1);
    }

    #[test]
    fn test_clean_points_empty_result() {
        let raw = vec![RawPoint::new(40.0, 10.0)];
        let err = clean_points(raw, &BoundingBox::default()).unwrap_err();
        assert!(matches!(err, RouteError::NoValidRows(1)));

        let cleaned = clean_points(vec![RawPoint::new(40.0, 10.0)], &BoundingBox::world()).unwrap();
        assert_eq!(cleaned.len(), 1);
    }
}
