//! Noise reduction over scalar series (speed, bearing).
//!
//! Both strategies are non-causal: the full track is known before
//! rendering, so each sample may look at its future neighbours.

use serde::{Deserialize, Serialize};

use crate::geo::normalize_bearing;

/// Gaussian kernels are truncated at this many standard deviations.
const GAUSSIAN_TRUNCATE: f64 = 4.0;

/// How a series is smoothed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SmoothingStrategy {
    /// Gaussian filter with sigma = window / 2, reflecting at the edges
    Gaussian { window: usize },
    /// Centered moving average; edge windows shrink instead of padding
    MovingAverage { window: usize },
}

impl Default for SmoothingStrategy {
    fn default() -> Self {
        Self::Gaussian { window: 5 }
    }
}

impl SmoothingStrategy {
    pub fn window(&self) -> usize {
        match self {
            SmoothingStrategy::Gaussian { window } | SmoothingStrategy::MovingAverage { window } => {
                *window
            }
        }
    }

    /// Smooth a linear series. Output length always equals input length.
    pub fn apply(&self, data: &[f64]) -> Vec<f64> {
        match *self {
            SmoothingStrategy::Gaussian { window } => gaussian_filter(data, window as f64 / 2.0),
            SmoothingStrategy::MovingAverage { window } => centered_moving_average(data, window),
        }
    }

    /// Smooth a series of bearings in degrees on the unit circle.
    ///
    /// Sine and cosine components are smoothed separately so headings on
    /// either side of north average to north rather than south.
    pub fn apply_circular(&self, bearings: &[f64]) -> Vec<f64> {
        let sines: Vec<f64> = bearings.iter().map(|b| b.to_radians().sin()).collect();
        let cosines: Vec<f64> = bearings.iter().map(|b| b.to_radians().cos()).collect();
        let sines = self.apply(&sines);
        let cosines = self.apply(&cosines);

        bearings
            .iter()
            .zip(sines.iter().zip(cosines.iter()))
            .map(|(&original, (&s, &c))| {
                // Opposing headings cancel out; keep the raw value there
                if s.hypot(c) < 1e-9 {
                    normalize_bearing(original)
                } else {
                    normalize_bearing(s.atan2(c).to_degrees())
                }
            })
            .collect()
    }
}

/// One-dimensional Gaussian filter with reflect boundary handling
/// (`d c b a | a b c d | d c b a`).
pub fn gaussian_filter(data: &[f64], sigma: f64) -> Vec<f64> {
    if data.is_empty() || sigma <= 0.0 {
        return data.to_vec();
    }

    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as isize;
    let n = data.len() as isize;

    (0..n)
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .map(|(k, w)| {
                    let idx = reflect_index(i + k as isize - radius, n);
                    w * data[idx]
                })
                .sum()
        })
        .collect()
}

/// Normalized Gaussian weights of radius `round(4 * sigma)`.
fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (GAUSSIAN_TRUNCATE * sigma + 0.5) as isize;
    let weights: Vec<f64> = (-radius..=radius)
        .map(|x| (-0.5 * (x as f64 / sigma).powi(2)).exp())
        .collect();
    let total: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// Map an out-of-range index back into `0..n` by mirroring at the edges.
fn reflect_index(i: isize, n: isize) -> usize {
    let period = 2 * n;
    let m = i.rem_euclid(period);
    if m < n {
        m as usize
    } else {
        (period - m - 1) as usize
    }
}

/// Centered moving average that never reaches beyond the sequence bounds.
///
/// Edge samples average over however many neighbours exist, so a window of
/// 5 at index 0 averages indices 0..=2.
pub fn centered_moving_average(data: &[f64], window: usize) -> Vec<f64> {
    if data.is_empty() || window <= 1 {
        return data.to_vec();
    }

    let half = window / 2;
    (0..data.len())
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + window - half).min(data.len());
            let slice = &data[start..end];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaussian_preserves_length_and_constants() {
        let data = vec![7.0; 12];
        let smoothed = gaussian_filter(&data, 2.5);
        assert_eq!(smoothed.len(), 12);
        for v in smoothed {
            assert!((v - 7.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_gaussian_kernel_sums_to_one() {
        let kernel = gaussian_kernel(2.5);
        assert_eq!(kernel.len(), 21);
        assert!((kernel.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(kernel[10] > kernel[9]);
    }

    #[test]
    fn test_gaussian_reduces_spike() {
        let mut data = vec![0.0; 21];
        data[10] = 100.0;
        let smoothed = gaussian_filter(&data, 2.5);
        assert!(smoothed[10] < 100.0);
        assert!(smoothed[9] > 0.0);
        // Reflect mode conserves mass away from the edges
        assert!((smoothed.iter().sum::<f64>() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_gaussian_short_series() {
        let smoothed = gaussian_filter(&[1.0, 3.0], 2.5);
        assert_eq!(smoothed.len(), 2);
        assert!(smoothed.iter().all(|v| (1.0..=3.0).contains(v)));
        assert!(gaussian_filter(&[], 2.5).is_empty());
    }

    #[test]
    fn test_reflect_index() {
        assert_eq!(reflect_index(-1, 4), 0);
        assert_eq!(reflect_index(-2, 4), 1);
        assert_eq!(reflect_index(4, 4), 3);
        assert_eq!(reflect_index(5, 4), 2);
        assert_eq!(reflect_index(2, 4), 2);
    }

    #[test]
    fn test_moving_average_edges_use_min_periods() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        let smoothed = centered_moving_average(&data, 3);
        assert_eq!(smoothed.len(), 5);
        assert!((smoothed[0] - 1.5).abs() < 1e-9);
        assert!((smoothed[2] - 3.0).abs() < 1e-9);
        assert!((smoothed[4] - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_moving_average_window_larger_than_data() {
        let smoothed = centered_moving_average(&[2.0, 4.0], 5);
        assert_eq!(smoothed, vec![3.0, 3.0]);
    }

    #[test]
    fn test_circular_smoothing_across_north() {
        let bearings = [350.0, 355.0, 5.0, 10.0, 355.0, 0.0];
        let smoothed = SmoothingStrategy::default().apply_circular(&bearings);
        assert_eq!(smoothed.len(), bearings.len());
        for b in smoothed {
            assert!((0.0..360.0).contains(&b));
            assert!(b > 340.0 || b < 20.0, "bearing {} drifted away from north", b);
        }
    }

    #[test]
    fn test_strategy_serde() {
        let json = serde_json::to_string(&SmoothingStrategy::MovingAverage { window: 7 }).unwrap();
        assert_eq!(json, r#"{"kind":"moving_average","window":7}"#);
        let parsed: SmoothingStrategy = serde_json::from_str(r#"{"kind":"gaussian","window":3}"#).unwrap();
        assert_eq!(parsed.window(), 3);
    }
}
