//! Great-circle geometry, bearing math and easing.

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two WGS84 coordinates.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    // Rounding can push sqrt(a) just above 1 for antipodal points
    let c = 2.0 * a.sqrt().min(1.0).asin();
    EARTH_RADIUS_M * c
}

/// Initial bearing (forward azimuth) from point 1 to point 2, in [0, 360).
pub fn compute_bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let y = dlon.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlon.cos();
    normalize_bearing(y.atan2(x).to_degrees())
}

/// Wrap any angle in degrees into [0, 360).
pub fn normalize_bearing(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can return exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Signed shortest-arc difference `b2 - b1`, in [-180, 180).
pub fn bearing_delta(b1: f64, b2: f64) -> f64 {
    (b2 - b1 + 180.0).rem_euclid(360.0) - 180.0
}

/// Interpolate between two bearings along the shorter arc.
pub fn interpolate_bearing(b1: f64, b2: f64, t: f64) -> f64 {
    normalize_bearing(b1 + bearing_delta(b1, b2) * t)
}

/// Cubic ease-in-out on [0, 1].
pub fn cubic_ease_in_out(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Linear interpolation.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_haversine_zero_for_identical_points() {
        assert!(haversine_distance(25.04, 121.56, 25.04, 121.56).abs() < EPS);
    }

    #[test]
    fn test_haversine_is_symmetric() {
        let pairs = [
            (25.04, 121.56, 24.15, 120.67),
            (0.0, 0.0, 0.0, 180.0),
            (-33.86, 151.21, 51.51, -0.13),
            (89.9, 10.0, -89.9, -170.0),
        ];
        for (lat1, lon1, lat2, lon2) in pairs {
            let ab = haversine_distance(lat1, lon1, lat2, lon2);
            let ba = haversine_distance(lat2, lon2, lat1, lon1);
            assert!((ab - ba).abs() < 1e-6, "{} != {}", ab, ba);
            assert!(ab > 0.0);
        }
    }

    #[test]
    fn test_haversine_known_distance() {
        // One degree of latitude is ~111.19 km on a 6371 km sphere
        let d = haversine_distance(25.0, 121.0, 26.0, 121.0);
        assert!((d - 111_194.9).abs() < 1.0, "got {}", d);
    }

    #[test]
    fn test_haversine_antipodal_does_not_nan() {
        let d = haversine_distance(0.0, 0.0, 0.0, 180.0);
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_M).abs() < 1.0);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        assert!(compute_bearing(25.0, 121.0, 25.1, 121.0).abs() < 1e-6);
        assert!((compute_bearing(0.0, 121.0, 0.0, 121.1) - 90.0).abs() < 1e-6);
        assert!((compute_bearing(25.1, 121.0, 25.0, 121.0) - 180.0).abs() < 1e-6);
        assert!((compute_bearing(0.0, 121.1, 0.0, 121.0) - 270.0).abs() < 1e-6);
    }

    #[test]
    fn test_bearing_range() {
        for (lat2, lon2) in [(24.0, 120.0), (26.0, 120.0), (24.0, 122.0), (26.0, 122.0)] {
            let b = compute_bearing(25.0, 121.0, lat2, lon2);
            assert!((0.0..360.0).contains(&b));
        }
    }

    #[test]
    fn test_interpolate_bearing_endpoints() {
        let cases = [(10.0, 350.0), (350.0, 10.0), (90.0, 270.0), (0.0, 0.0), (45.0, 180.0)];
        for (b1, b2) in cases {
            assert!((interpolate_bearing(b1, b2, 0.0) - b1).abs() < EPS);
            let end = interpolate_bearing(b1, b2, 1.0);
            assert!(bearing_delta(end, b2).abs() < EPS, "{} vs {}", end, b2);
        }
    }

    #[test]
    fn test_interpolate_bearing_crosses_north() {
        // 350 -> 10 goes through 0, not through 180
        let mid = interpolate_bearing(350.0, 10.0, 0.5);
        assert!(mid.abs() < EPS || (mid - 360.0).abs() < EPS);

        for i in 0..=10 {
            let t = i as f64 / 10.0;
            let b = interpolate_bearing(350.0, 10.0, t);
            assert!(bearing_delta(350.0, b).abs() <= 20.0 + EPS);
        }
    }

    #[test]
    fn test_bearing_delta_never_exceeds_half_turn() {
        for b1 in (0..360).step_by(15) {
            for b2 in (0..360).step_by(15) {
                let d = bearing_delta(b1 as f64, b2 as f64);
                assert!((-180.0..=180.0).contains(&d));
            }
        }
    }

    #[test]
    fn test_cubic_ease_fixed_points() {
        assert!(cubic_ease_in_out(0.0).abs() < EPS);
        assert!((cubic_ease_in_out(1.0) - 1.0).abs() < EPS);
        assert!((cubic_ease_in_out(0.5) - 0.5).abs() < EPS);
    }

    #[test]
    fn test_cubic_ease_is_monotonic() {
        let mut prev = cubic_ease_in_out(0.0);
        for i in 1..=1000 {
            let v = cubic_ease_in_out(i as f64 / 1000.0);
            assert!(v >= prev);
            assert!((0.0..=1.0).contains(&v));
            prev = v;
        }
    }
}
