//! Turns raw GPS rows into the augmented [`Track`].

use chrono::{DateTime, Utc};
use relive_models::{GpsPoint, RawPoint, Track};
use tracing::{debug, info};

use crate::config::{MatchingConfig, RouteConfig};
use crate::error::RouteResult;
use crate::geo::{compute_bearing, haversine_distance};
use crate::loader::clean_points;
use crate::matcher::{snap_to_roads, RoadMatcher};

const MS_TO_KMH: f64 = 3.6;

/// Cleans, smooths, snaps and annotates a GPS trace.
#[derive(Debug, Clone, Default)]
pub struct RouteProcessor {
    route: RouteConfig,
    matching: MatchingConfig,
}

impl RouteProcessor {
    pub fn new(route: RouteConfig, matching: MatchingConfig) -> Self {
        Self { route, matching }
    }

    /// Process raw rows into a track.
    ///
    /// Road snapping runs only when matching is enabled and a matcher is
    /// given; it never fails the run.
    pub async fn process(
        &self,
        raw: Vec<RawPoint>,
        matcher: Option<&dyn RoadMatcher>,
    ) -> RouteResult<Track> {
        let points = clean_points(raw, &self.route.bounding_box)?;

        let recorded_speeds: Vec<f64> = points.iter().map(|p| p.speed_kmh.unwrap_or(0.0)).collect();
        let has_speed = recorded_speeds.iter().any(|s| *s > 0.0);
        let speeds = if has_speed {
            recorded_speeds
        } else {
            debug!("No usable speed column, deriving speed from distance");
            derive_speeds(
                &points,
                self.route.sampling_interval_seconds,
                self.route.glitch_distance_m,
            )
        };

        let speeds: Vec<f64> = self
            .route
            .smoothing
            .apply(&speeds)
            .into_iter()
            .map(|s| s.max(0.0))
            .collect();

        let coordinates: Vec<[f64; 2]> = points.iter().map(|p| [p.longitude, p.latitude]).collect();
        let timestamps: Vec<Option<DateTime<Utc>>> = points.iter().map(|p| p.timestamp).collect();

        let (coordinates, speeds, timestamps) = match matcher {
            Some(matcher) if self.matching.enabled && coordinates.len() >= 2 => {
                let snapped =
                    snap_to_roads(matcher, &self.matching, &coordinates, &speeds, &timestamps)
                        .await;
                info!(
                    input_points = coordinates.len(),
                    output_points = snapped.len(),
                    matched_batches = snapped.matched_batches,
                    failed_batches = snapped.failed_batches,
                    "Road snapping finished"
                );
                (snapped.coordinates, snapped.speeds, snapped.timestamps)
            }
            _ => (coordinates, speeds, timestamps),
        };

        let bearings = self.route.smoothing.apply_circular(&raw_bearings(&coordinates));
        let distances_km = cumulative_distance_km(&coordinates);
        let times = if timestamps.iter().all(|t| t.is_some()) && !timestamps.is_empty() {
            elapsed_from_timestamps(&timestamps)
        } else {
            self.estimate_elapsed(&distances_km, &speeds)
        };

        let track = Track::new(
            coordinates
                .iter()
                .enumerate()
                .map(|(i, c)| GpsPoint {
                    latitude: c[1],
                    longitude: c[0],
                    speed_kmh: speeds[i],
                    bearing_deg: bearings[i],
                    distance_km: distances_km[i],
                    time_seconds: times[i],
                    timestamp: timestamps[i],
                })
                .collect(),
        );

        info!(
            points = track.len(),
            distance_km = %format!("{:.2}", track.total_distance_km()),
            avg_speed_kmh = %format!("{:.1}", track.average_speed_kmh()),
            max_speed_kmh = %format!("{:.1}", track.max_speed_kmh()),
            duration = %relive_models::format_time(track.total_duration_seconds()),
            "Route processed"
        );

        Ok(track)
    }

    /// Elapsed time without timestamps: distance over speed while moving,
    /// a fixed step while stationary.
    fn estimate_elapsed(&self, distances_km: &[f64], speeds: &[f64]) -> Vec<f64> {
        let mut times = Vec::with_capacity(distances_km.len());
        let mut elapsed = 0.0;
        for i in 0..distances_km.len() {
            if i > 0 {
                let step_km = distances_km[i] - distances_km[i - 1];
                elapsed += if speeds[i] > self.route.motion_threshold_kmh {
                    step_km / speeds[i] * 3600.0
                } else {
                    self.route.stationary_step_seconds
                };
            }
            times.push(elapsed);
        }
        times
    }
}

/// Speed in km/h from consecutive distances at a fixed sampling interval.
///
/// The first point is 0. Jumps at or beyond `glitch_distance_m` are GPS
/// glitches and also get 0.
pub fn derive_speeds(points: &[RawPoint], interval_seconds: f64, glitch_distance_m: f64) -> Vec<f64> {
    let mut speeds = Vec::with_capacity(points.len());
    if points.is_empty() {
        return speeds;
    }
    speeds.push(0.0);
    for pair in points.windows(2) {
        let d = haversine_distance(
            pair[0].latitude,
            pair[0].longitude,
            pair[1].latitude,
            pair[1].longitude,
        );
        if d >= glitch_distance_m {
            speeds.push(0.0);
        } else {
            speeds.push(d / interval_seconds * MS_TO_KMH);
        }
    }
    speeds
}

/// Per-step bearing of `[lon, lat]` pairs; the last point repeats the
/// previous bearing and a single point faces north.
fn raw_bearings(coordinates: &[[f64; 2]]) -> Vec<f64> {
    let mut bearings: Vec<f64> = coordinates
        .windows(2)
        .map(|w| compute_bearing(w[0][1], w[0][0], w[1][1], w[1][0]))
        .collect();
    let last = bearings.last().copied().unwrap_or(0.0);
    if !coordinates.is_empty() {
        bearings.push(last);
    }
    bearings
}

fn cumulative_distance_km(coordinates: &[[f64; 2]]) -> Vec<f64> {
    let mut total = 0.0;
    let mut distances = Vec::with_capacity(coordinates.len());
    for (i, c) in coordinates.iter().enumerate() {
        if i > 0 {
            let prev = coordinates[i - 1];
            total += haversine_distance(prev[1], prev[0], c[1], c[0]) / 1000.0;
        }
        distances.push(total);
    }
    distances
}

/// Seconds since the first timestamp, never decreasing.
fn elapsed_from_timestamps(timestamps: &[Option<DateTime<Utc>>]) -> Vec<f64> {
    let Some(first) = timestamps.first().copied().flatten() else {
        return vec![0.0; timestamps.len()];
    };
    let mut latest = 0.0f64;
    timestamps
        .iter()
        .map(|t| {
            let offset = t
                .map(|t| (t - first).num_milliseconds() as f64 / 1000.0)
                .unwrap_or(latest);
            latest = latest.max(offset);
            latest
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::STATIONARY_STEP_SECONDS;
    use crate::matcher::MatchResult;
    use async_trait::async_trait;
    use chrono::TimeZone;

    /// ~111 m per 0.001 degree of latitude
    fn northbound(n: usize) -> Vec<RawPoint> {
        (0..n).map(|i| RawPoint::new(25.0 + i as f64 * 0.001, 121.0)).collect()
    }

    #[test]
    fn test_derive_speeds() {
        let speeds = derive_speeds(&northbound(3), 5.0, 500.0);
        assert_eq!(speeds[0], 0.0);
        // 111.19 m in 5 s = 80.06 km/h
        assert!((speeds[1] - 80.06).abs() < 0.1, "got {}", speeds[1]);

        let jump = vec![RawPoint::new(25.0, 121.0), RawPoint::new(25.01, 121.0)];
        assert_eq!(derive_speeds(&jump, 5.0, 500.0), vec![0.0, 0.0]);
    }

    #[test]
    fn test_raw_bearings_repeat_last() {
        let coords = [[121.0, 25.0], [121.0, 25.001], [121.001, 25.001]];
        let bearings = raw_bearings(&coords);
        assert_eq!(bearings.len(), 3);
        assert!(bearings[0].abs() < 1e-6);
        assert_eq!(bearings[1], bearings[2]);
        assert_eq!(raw_bearings(&[[121.0, 25.0]]), vec![0.0]);
    }

    #[test]
    fn test_elapsed_from_timestamps_is_monotonic() {
        let ts = |s: i64| Utc.timestamp_opt(1_700_000_000 + s, 0).single();
        let elapsed = elapsed_from_timestamps(&[ts(0), ts(10), ts(5), ts(20)]);
        assert_eq!(elapsed, vec![0.0, 10.0, 10.0, 20.0]);
    }

    #[tokio::test]
    async fn test_process_derives_track() {
        let processor = RouteProcessor::default();
        let track = processor.process(northbound(20), None).await.unwrap();

        assert_eq!(track.len(), 20);
        let points = track.points();
        assert_eq!(points[0].distance_km, 0.0);
        assert_eq!(points[0].time_seconds, 0.0);
        for pair in points.windows(2) {
            assert!(pair[1].distance_km >= pair[0].distance_km);
            assert!(pair[1].time_seconds >= pair[0].time_seconds);
        }
        for p in points {
            assert!(p.speed_kmh >= 0.0);
            assert!(p.bearing_deg < 5.0 || p.bearing_deg > 355.0);
        }
        assert!((track.total_distance_km() - 19.0 * 0.11119).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_stationary_points_use_fixed_step() {
        let raw = vec![
            RawPoint::new(25.0, 121.0).with_speed(0.0),
            RawPoint::new(25.00001, 121.0).with_speed(0.0),
            RawPoint::new(25.00002, 121.0).with_speed(0.0),
        ];
        let track = RouteProcessor::default().process(raw, None).await.unwrap();
        // Derived speeds are well below the motion threshold
        assert!((track.total_duration_seconds() - 2.0 * STATIONARY_STEP_SECONDS).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_timestamps_drive_elapsed_time() {
        let raw: Vec<RawPoint> = northbound(4)
            .into_iter()
            .enumerate()
            .map(|(i, p)| {
                p.with_speed(40.0)
                    .with_timestamp(Utc.timestamp_opt(1_700_000_000 + i as i64 * 30, 0).unwrap())
            })
            .collect();
        let track = RouteProcessor::default().process(raw, None).await.unwrap();
        assert!(track.has_timestamps());
        assert_eq!(track.total_duration_seconds(), 90.0);
        assert!((track.average_speed_kmh() - 40.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_single_point_track() {
        let track = RouteProcessor::default()
            .process(vec![RawPoint::new(25.0, 121.0)], None)
            .await
            .unwrap();
        assert_eq!(track.len(), 1);
        assert_eq!(track.points()[0].bearing_deg, 0.0);
        assert_eq!(track.total_distance_km(), 0.0);
    }

    struct ShiftEast;

    #[async_trait]
    impl RoadMatcher for ShiftEast {
        async fn match_batch(&self, coordinates: &[[f64; 2]]) -> MatchResult<Vec<[f64; 2]>> {
            Ok(coordinates.iter().map(|c| [c[0] + 0.0001, c[1]]).collect())
        }
    }

    #[tokio::test]
    async fn test_matcher_applied_only_when_enabled() {
        let mut matching = MatchingConfig {
            batch_delay_ms: 0,
            ..Default::default()
        };
        let processor = RouteProcessor::new(RouteConfig::default(), matching.clone());
        let track = processor.process(northbound(5), Some(&ShiftEast)).await.unwrap();
        assert!((track.points()[0].longitude - 121.0001).abs() < 1e-9);

        matching.enabled = false;
        let processor = RouteProcessor::new(RouteConfig::default(), matching);
        let track = processor.process(northbound(5), Some(&ShiftEast)).await.unwrap();
        assert_eq!(track.points()[0].longitude, 121.0);
    }
}
