//! Property tests for side classification

use proptest::prelude::*;
use route_poi::{determine_side, geo_utils, majority_side, Side};

proptest! {
    #[test]
    fn prop_straight_ahead_and_behind_are_right(b in 0u32..360) {
        let b = b as f64;
        prop_assert_eq!(determine_side(b, b), Side::Right);
        prop_assert_eq!(determine_side(b + 180.0, b), Side::Right);
    }

    #[test]
    fn prop_quarter_turns(b in 0u32..360) {
        let b = b as f64;
        prop_assert_eq!(determine_side(b + 90.0, b), Side::Right);
        prop_assert_eq!(determine_side(b - 90.0, b), Side::Left);
    }

    #[test]
    fn prop_side_ignores_full_turns(poi in 0.0f64..360.0, route in 0.0f64..360.0) {
        prop_assert_eq!(determine_side(poi, route), determine_side(poi, route + 360.0));
    }

    #[test]
    fn prop_bearing_in_range(
        lat1 in -80.0f64..80.0, lon1 in -179.0f64..179.0,
        lat2 in -80.0f64..80.0, lon2 in -179.0f64..179.0,
    ) {
        let b = geo_utils::bearing(lat1, lon1, lat2, lon2);
        prop_assert!((0.0..360.0).contains(&b));
    }

    #[test]
    fn prop_east_on_equator(lon in -170.0f64..170.0, eps in 1e-6f64..1e-2) {
        let b = geo_utils::bearing(0.0, lon, 0.0, lon + eps);
        prop_assert!((b - 90.0).abs() < 1e-6);
    }

    #[test]
    fn prop_majority_follows_counts(right in 0usize..20, left in 0usize..20) {
        let votes = std::iter::repeat(Side::Right).take(right)
            .chain(std::iter::repeat(Side::Left).take(left));
        let expected = if right >= left { Side::Right } else { Side::Left };
        prop_assert_eq!(majority_side(votes), expected);
    }
}
