//! Best-effort road snapping.
//!
//! The [`RoadMatcher`] trait is the seam to the external map-matching
//! service. [`snap_to_roads`] never fails: a batch the matcher cannot handle
//! keeps its original coordinates.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::MatchingConfig;

/// Result type for a single matching call.
pub type MatchResult<T> = Result<T, MatchError>;

/// Why a batch could not be snapped.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Batch of {0} points is outside the accepted range")]
    InvalidBatch(usize),

    #[error("Matching request failed: {0}")]
    Request(String),

    #[error("Matching service returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("No match for batch: {0}")]
    NoMatch(String),

    #[error("Malformed matching response: {0}")]
    Malformed(String),
}

impl MatchError {
    pub fn request(msg: impl Into<String>) -> Self {
        Self::Request(msg.into())
    }

    pub fn no_match(msg: impl Into<String>) -> Self {
        Self::NoMatch(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// Check if a retry could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            MatchError::Request(_) => true,
            MatchError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// External map-matching collaborator.
#[async_trait]
pub trait RoadMatcher: Send + Sync {
    /// Snap one batch of `[lon, lat]` coordinates onto the road network.
    ///
    /// The returned geometry may have a different length than the input.
    async fn match_batch(&self, coordinates: &[[f64; 2]]) -> MatchResult<Vec<[f64; 2]>>;
}

/// Coordinates with their per-point speed and timestamp after snapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnappedTrace {
    /// `[lon, lat]` pairs
    pub coordinates: Vec<[f64; 2]>,
    pub speeds: Vec<f64>,
    pub timestamps: Vec<Option<DateTime<Utc>>>,
    pub matched_batches: usize,
    pub failed_batches: usize,
}

impl SnappedTrace {
    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }
}

/// Snap a trace batch by batch.
///
/// `coordinates`, `speeds` and `timestamps` must have equal length. When a
/// batch comes back with a different number of points, speeds and
/// timestamps are resampled linearly over normalized index position.
pub async fn snap_to_roads(
    matcher: &dyn RoadMatcher,
    config: &MatchingConfig,
    coordinates: &[[f64; 2]],
    speeds: &[f64],
    timestamps: &[Option<DateTime<Utc>>],
) -> SnappedTrace {
    let batch_size = config.batch_size.max(1);
    let total_batches = coordinates.len().div_ceil(batch_size);
    let mut trace = SnappedTrace {
        coordinates: Vec::with_capacity(coordinates.len()),
        speeds: Vec::with_capacity(speeds.len()),
        timestamps: Vec::with_capacity(timestamps.len()),
        ..Default::default()
    };

    for (batch_index, start) in (0..coordinates.len()).step_by(batch_size).enumerate() {
        let end = (start + batch_size).min(coordinates.len());
        let batch_coords = &coordinates[start..end];
        let batch_speeds = &speeds[start..end];
        let batch_times = &timestamps[start..end];

        match matcher.match_batch(batch_coords).await {
            Ok(snapped) if !snapped.is_empty() => {
                debug!(
                    batch = batch_index + 1,
                    total_batches,
                    input = batch_coords.len(),
                    output = snapped.len(),
                    "Batch snapped to roads"
                );
                if snapped.len() == batch_coords.len() {
                    trace.speeds.extend_from_slice(batch_speeds);
                    trace.timestamps.extend_from_slice(batch_times);
                } else {
                    trace.speeds.extend(resample_linear(batch_speeds, snapped.len()));
                    trace.timestamps.extend(resample_timestamps(batch_times, snapped.len()));
                }
                trace.coordinates.extend(snapped);
                trace.matched_batches += 1;
            }
            result => {
                match result {
                    Err(e) => warn!(
                        batch = batch_index + 1,
                        total_batches,
                        error = %e,
                        "Road snapping failed, keeping original coordinates"
                    ),
                    Ok(_) => warn!(
                        batch = batch_index + 1,
                        total_batches,
                        "Road snapping returned no geometry, keeping original coordinates"
                    ),
                }
                trace.coordinates.extend_from_slice(batch_coords);
                trace.speeds.extend_from_slice(batch_speeds);
                trace.timestamps.extend_from_slice(batch_times);
                trace.failed_batches += 1;
            }
        }

        if batch_index + 1 < total_batches && !config.batch_delay().is_zero() {
            tokio::time::sleep(config.batch_delay()).await;
        }
    }

    trace
}

/// Resample `values` to `len` samples by linear interpolation over
/// normalized index position.
pub fn resample_linear(values: &[f64], len: usize) -> Vec<f64> {
    match (values.len(), len) {
        (_, 0) | (0, _) => Vec::new(),
        (1, n) => vec![values[0]; n],
        (_, 1) => vec![values[0]],
        (m, n) => (0..n)
            .map(|j| {
                let pos = j as f64 * (m - 1) as f64 / (n - 1) as f64;
                let lo = (pos.floor() as usize).min(m - 1);
                let hi = (lo + 1).min(m - 1);
                let frac = pos - lo as f64;
                values[lo] + (values[hi] - values[lo]) * frac
            })
            .collect(),
    }
}

/// Resample timestamps like [`resample_linear`]; all-or-nothing, so a batch
/// with any missing timestamp yields `None` everywhere.
fn resample_timestamps(values: &[Option<DateTime<Utc>>], len: usize) -> Vec<Option<DateTime<Utc>>> {
    let millis: Option<Vec<f64>> = values
        .iter()
        .map(|t| t.map(|t| t.timestamp_millis() as f64))
        .collect();

    match millis {
        Some(millis) if !millis.is_empty() => resample_linear(&millis, len)
            .into_iter()
            .map(|ms| Utc.timestamp_millis_opt(ms.round() as i64).single())
            .collect(),
        _ => vec![None; len],
    }
}
