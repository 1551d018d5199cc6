//! Parallel stop photo capture.

use std::sync::Arc;

use futures::future::join_all;
use relive_models::{Stop, StopPhoto, Track};
use relive_providers::{PhotoProvider, ProviderError};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::metrics;

/// Capture photos for the first `max_photos` stops with at most `workers`
/// requests in flight.
///
/// Returns one entry per captured photo, in stop order. A stop whose
/// capture fails is logged and left without a photo.
pub async fn capture_stop_photos(
    provider: &dyn PhotoProvider,
    track: &Track,
    stops: &[Stop],
    max_photos: usize,
    workers: usize,
) -> Vec<StopPhoto> {
    let selected = &stops[..stops.len().min(max_photos)];
    if selected.is_empty() {
        return Vec::new();
    }

    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    info!(
        stops = selected.len(),
        workers = workers.max(1),
        "Capturing stop photos"
    );

    let tasks = selected.iter().map(|stop| {
        let semaphore = Arc::clone(&semaphore);
        let heading = track
            .get(stop.point_index)
            .map(|p| p.bearing_deg)
            .unwrap_or(0.0);

        async move {
            let _permit = semaphore.acquire().await.ok()?;
            match provider.capture(stop.latitude, stop.longitude, heading).await {
                Ok(image) => {
                    debug!(stop = stop.sequence_number, bytes = image.len(), "Photo captured");
                    metrics::record_photo(true);
                    Some(StopPhoto {
                        stop_index: stop.point_index,
                        image,
                        latitude: stop.latitude,
                        longitude: stop.longitude,
                        sequence_number: stop.sequence_number,
                    })
                }
                Err(ProviderError::NoImagery(location)) => {
                    debug!(stop = stop.sequence_number, %location, "No street-level imagery");
                    metrics::record_photo(false);
                    None
                }
                Err(e) => {
                    warn!(stop = stop.sequence_number, error = %e, "Photo capture failed");
                    metrics::record_photo(false);
                    None
                }
            }
        }
    });

    let photos: Vec<StopPhoto> = join_all(tasks).await.into_iter().flatten().collect();
    info!(
        captured = photos.len(),
        attempted = selected.len(),
        "Stop photos captured"
    );
    photos
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use relive_models::GpsPoint;
    use relive_providers::ProviderResult;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Fails for stops west of 121.0015; tracks peak concurrency.
    struct FakePhotos {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    impl FakePhotos {
        fn new() -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PhotoProvider for FakePhotos {
        async fn capture(&self, _lat: f64, lon: f64, heading: f64) -> ProviderResult<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if lon < 121.0015 {
                return Err(ProviderError::NoImagery(format!("{lon}")));
            }
            Ok(vec![heading as u8])
        }
    }

    fn track(n: usize) -> Track {
        Track::new(
            (0..n)
                .map(|i| GpsPoint {
                    latitude: 25.0,
                    longitude: 121.0 + i as f64 * 0.001,
                    speed_kmh: 0.0,
                    bearing_deg: i as f64 * 10.0,
                    distance_km: 0.0,
                    time_seconds: i as f64 * 5.0,
                    timestamp: None,
                })
                .collect(),
        )
    }

    fn stops(track: &Track) -> Vec<Stop> {
        track
            .points()
            .iter()
            .enumerate()
            .map(|(i, p)| Stop {
                point_index: i,
                latitude: p.latitude,
                longitude: p.longitude,
                sequence_number: i as u32 + 1,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_results_in_stop_order_skipping_failures() {
        let track = track(8);
        let provider = FakePhotos::new();

        let photos = capture_stop_photos(&provider, &track, &stops(&track), 20, 3).await;

        // Stops 0 and 1 have no imagery
        let order: Vec<u32> = photos.iter().map(|p| p.sequence_number).collect();
        assert_eq!(order, vec![3, 4, 5, 6, 7, 8]);
        // Heading comes from the stop's bearing
        assert_eq!(photos[0].image, vec![20]);
        assert_eq!(photos[0].stop_index, 2);
        assert!(provider.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_capped_at_max_photos() {
        let track = track(10);
        let provider = FakePhotos::new();

        let photos = capture_stop_photos(&provider, &track, &stops(&track), 4, 5).await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 4);
        assert_eq!(photos.len(), 2);
    }

    #[tokio::test]
    async fn test_no_stops_no_requests() {
        let track = track(3);
        let provider = FakePhotos::new();
        assert!(capture_stop_photos(&provider, &track, &[], 20, 5).await.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }
}
