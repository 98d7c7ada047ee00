//! Side classification relative to the direction of travel.
//!
//! A POI is on the right of the route when its bearing from the route point
//! lies within the closed half-turn clockwise of the local route heading.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geo_utils::bearing;
use crate::RoutePoint;

/// Which side of the route a POI lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Column label used in result tables.
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "Left",
            Side::Right => "Right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a POI bearing against the route bearing.
///
/// `delta = (poi_bearing - route_bearing + 360) mod 360`. The POI is on the
/// right when `0 <= delta <= 180`; both boundaries are inclusive, so a POI
/// straight ahead or straight behind is reported as `Right`.
///
/// # Example
///
/// ```rust
/// use route_poi::{determine_side, Side};
///
/// assert_eq!(determine_side(90.0, 0.0), Side::Right);
/// assert_eq!(determine_side(270.0, 0.0), Side::Left);
/// assert_eq!(determine_side(180.0, 0.0), Side::Right);
/// ```
pub fn determine_side(poi_bearing: f64, route_bearing: f64) -> Side {
    let delta = (poi_bearing - route_bearing + 360.0).rem_euclid(360.0);
    if (0.0..=180.0).contains(&delta) {
        Side::Right
    } else {
        Side::Left
    }
}

/// Bearing of every segment between consecutive route points.
///
/// Returns `points.len() - 1` values (empty for fewer than two points).
pub fn segment_bearings(points: &[RoutePoint]) -> Vec<f64> {
    points
        .windows(2)
        .map(|w| bearing(w[0].latitude, w[0].longitude, w[1].latitude, w[1].longitude))
        .collect()
}

/// Local route heading at route point `index`.
///
/// Point `i` uses segment `i`; points past the last segment reuse the final
/// segment's bearing. `None` when the route has no segments.
pub fn route_heading_at(segment_bearings: &[f64], index: usize) -> Option<f64> {
    segment_bearings
        .get(index)
        .or_else(|| segment_bearings.last())
        .copied()
}

/// Consensus side by majority vote. `Right` wins ties (and the empty vote).
pub fn majority_side<I>(sides: I) -> Side
where
    I: IntoIterator<Item = Side>,
{
    let (right, left) = sides.into_iter().fold((0usize, 0usize), |(r, l), side| match side {
        Side::Right => (r + 1, l),
        Side::Left => (r, l + 1),
    });

    if right >= left {
        Side::Right
    } else {
        Side::Left
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_boundaries_inclusive() {
        for b in [0.0, 45.0, 90.0, 200.0, 359.0] {
            assert_eq!(determine_side(b, b), Side::Right);
            assert_eq!(determine_side(b + 180.0, b), Side::Right);
            assert_eq!(determine_side(b + 90.0, b), Side::Right);
            assert_eq!(determine_side(b - 90.0, b), Side::Left);
        }
    }

    #[test]
    fn test_side_wraps_across_north() {
        // Heading 350, POI at 10 is 20 degrees clockwise
        assert_eq!(determine_side(10.0, 350.0), Side::Right);
        // Heading 10, POI at 350 is 20 degrees counter-clockwise
        assert_eq!(determine_side(350.0, 10.0), Side::Left);
    }

    #[test]
    fn test_segment_bearings() {
        let route = vec![
            RoutePoint::new(10.0, 106.0, 0),
            RoutePoint::new(10.001, 106.0, 1),
            RoutePoint::new(10.001, 106.001, 2),
        ];
        let bearings = segment_bearings(&route);
        assert_eq!(bearings.len(), 2);
        assert!(bearings[0].abs() < 1e-9);
        assert!((bearings[1] - 90.0).abs() < 0.01);
    }

    #[test]
    fn test_segment_bearings_degenerate() {
        assert!(segment_bearings(&[]).is_empty());
        assert!(segment_bearings(&[RoutePoint::new(10.0, 106.0, 0)]).is_empty());
    }

    #[test]
    fn test_route_heading_reuses_last_segment() {
        let bearings = [10.0, 20.0];
        assert_eq!(route_heading_at(&bearings, 0), Some(10.0));
        assert_eq!(route_heading_at(&bearings, 1), Some(20.0));
        assert_eq!(route_heading_at(&bearings, 2), Some(20.0));
        assert_eq!(route_heading_at(&[], 0), None);
    }

    #[test]
    fn test_majority_side() {
        use Side::*;
        assert_eq!(majority_side([Right, Right, Right, Left, Left]), Right);
        assert_eq!(majority_side([Left, Left, Right]), Left);
        assert_eq!(majority_side([Left, Right]), Right);
        assert_eq!(majority_side(Vec::<Side>::new()), Right);
    }

    #[test]
    fn test_side_display() {
        assert_eq!(Side::Left.to_string(), "Left");
        assert_eq!(Side::Right.to_string(), "Right");
    }
}
