//! Circular angle helpers shared by the ephemeris and the matcher.

/// Wrap any real angle into `[0, 360)`.
#[must_use]
pub fn normalize_degrees(deg: f64) -> f64 {
    let d = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if d >= 360.0 {
        0.0
    } else {
        d
    }
}

/// Shortest separation between two points on a 360° circle, in `[0, 180]`.
///
/// Inputs need not be normalized: `angular_distance(10.0, 370.0) == 0.0`.
#[must_use]
pub fn angular_distance(a: f64, b: f64) -> f64 {
    let d = (a - b).abs() % 360.0;
    d.min(360.0 - d)
}

/// Round an orb to 4 decimal places for presentation and ranking.
#[must_use]
pub fn round_orb(orb: f64) -> f64 {
    (orb * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn wraparound_pair() {
        assert!((angular_distance(359.0, 1.0) - 2.0).abs() < 1e-12);
        assert!((angular_distance(1.0, 359.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn full_turn_is_zero() {
        assert!(angular_distance(10.0, 370.0).abs() < 1e-12);
        assert!(angular_distance(10.0, 10.0).abs() < 1e-12);
        assert!(angular_distance(-350.0, 10.0).abs() < 1e-12);
    }

    #[test]
    fn opposite_points_are_180_apart() {
        assert!((angular_distance(0.0, 180.0) - 180.0).abs() < 1e-12);
        assert!((angular_distance(90.0, 270.0) - 180.0).abs() < 1e-12);
    }

    #[test]
    fn normalize_handles_negative_and_large_angles() {
        assert!((normalize_degrees(-30.0) - 330.0).abs() < 1e-12);
        assert!((normalize_degrees(725.0) - 5.0).abs() < 1e-12);
        assert!(normalize_degrees(360.0).abs() < 1e-12);
        let tiny = normalize_degrees(-1e-20);
        assert!((0.0..360.0).contains(&tiny));
    }

    #[test]
    fn round_orb_keeps_four_decimals() {
        assert!((round_orb(1.234_567) - 1.2346).abs() < 1e-12);
        assert!((round_orb(0.000_04) - 0.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn distance_is_symmetric(a in -1.0e4f64..1.0e4, b in -1.0e4f64..1.0e4) {
            let ab = angular_distance(a, b);
            let ba = angular_distance(b, a);
            prop_assert!((ab - ba).abs() < 1e-9);
        }

        #[test]
        fn distance_is_within_half_turn(a in -1.0e4f64..1.0e4, b in -1.0e4f64..1.0e4) {
            let d = angular_distance(a, b);
            prop_assert!((0.0..=180.0).contains(&d), "distance {} out of range", d);
        }

        #[test]
        fn distance_ignores_whole_turns(a in -720.0f64..720.0, b in -720.0f64..720.0, k in -3i32..3) {
            let shifted = b + f64::from(k) * 360.0;
            prop_assert!((angular_distance(a, b) - angular_distance(a, shifted)).abs() < 1e-9);
        }
    }
}
