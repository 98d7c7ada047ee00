//! # Geographic Utilities
//!
//! Core geographic computations shared by the side classifier and the
//! position optimizer.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`bearing`] | Initial great-circle bearing between two coordinates |
//! | [`haversine_distance_and_bearing`] | Distance in meters paired with the bearing |
//! | [`haversine_distance`] | Great-circle distance between two GPS points |
//! | [`destination_point`] | Project a point along a bearing for a distance |
//! | [`compute_center`] | Arithmetic centroid of a set of points |
//!
//! ## Example
//!
//! ```rust
//! use route_poi::geo_utils;
//!
//! // Heading due east along the equator
//! let heading = geo_utils::bearing(0.0, 0.0, 0.0, 0.001);
//! assert!((heading - 90.0).abs() < 1e-6);
//!
//! let (distance, bearing) = geo_utils::haversine_distance_and_bearing(0.0, 0.0, 0.001, 0.0);
//! assert!((distance - 111.2).abs() < 0.5);
//! assert!(bearing.abs() < 1e-9);
//! ```
//!
//! ## Coordinate System
//!
//! All functions take WGS84 latitude/longitude in degrees and return angles in
//! degrees. Bearings are measured clockwise from north and normalized to
//! `[0, 360)`. Distances use the haversine formulas from the `geo` crate,
//! rescaled to a spherical Earth of radius [`EARTH_RADIUS_METERS`].
//!
//! Latitudes outside `[-90, 90]` are not rejected here; callers validate
//! their inputs first (see [`GpsPoint::is_valid`]).

use geo::{Bearing, Destination, Distance, Haversine, Point};

use crate::GpsPoint;

/// Earth radius used for every distance and projection, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Radius `geo`'s haversine functions are built on.
const GEO_MEAN_RADIUS_METERS: f64 = 6_371_008.8;

/// Converts a `geo` haversine distance to one on [`EARTH_RADIUS_METERS`].
const TO_EARTH_RADIUS: f64 = EARTH_RADIUS_METERS / GEO_MEAN_RADIUS_METERS;

// =============================================================================
// Bearing Functions
// =============================================================================

/// Fold an angle in degrees into `[0, 360)`.
#[inline]
pub fn normalize_bearing(degrees: f64) -> f64 {
    let folded = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if folded >= 360.0 {
        0.0
    } else {
        folded
    }
}

/// Initial great-circle bearing from point 1 to point 2.
///
/// Returns degrees in `[0, 360)`, with 0 = north and angles increasing
/// clockwise. Identical points yield 0.
///
/// # Example
///
/// ```rust
/// use route_poi::geo_utils::bearing;
///
/// // Due north
/// assert!(bearing(10.0, 106.0, 10.001, 106.0).abs() < 1e-9);
/// // Due west
/// assert!((bearing(0.0, 0.0, 0.0, -0.01) - 270.0).abs() < 1e-6);
/// ```
#[inline]
pub fn bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let origin = Point::new(lon1, lat1);
    let destination = Point::new(lon2, lat2);
    normalize_bearing(Haversine::bearing(origin, destination))
}

// =============================================================================
// Distance Functions
// =============================================================================

/// Great-circle distance between two GPS points in meters.
///
/// # Example
///
/// ```rust
/// use route_poi::{GpsPoint, geo_utils};
///
/// let london = GpsPoint::new(51.5074, -0.1278);
/// let paris = GpsPoint::new(48.8566, 2.3522);
///
/// let distance = geo_utils::haversine_distance(&london, &paris);
/// assert!((distance - 343_560.0).abs() < 1000.0); // ~344 km
/// ```
#[inline]
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    let point1 = Point::new(p1.longitude, p1.latitude);
    let point2 = Point::new(p2.longitude, p2.latitude);
    Haversine::distance(point1, point2) * TO_EARTH_RADIUS
}

/// Distance in meters and initial bearing in degrees from point 1 to point 2.
///
/// The bearing is the same value [`bearing`] returns for the same pair, so
/// side classification and distance weighting always agree on geometry.
pub fn haversine_distance_and_bearing(
    lat1: f64,
    lon1: f64,
    lat2: f64,
    lon2: f64,
) -> (f64, f64) {
    let origin = Point::new(lon1, lat1);
    let destination = Point::new(lon2, lat2);
    let distance = Haversine::distance(origin, destination) * TO_EARTH_RADIUS;
    let heading = normalize_bearing(Haversine::bearing(origin, destination));
    (distance, heading)
}

/// Project a new position from `(lat, lon)` along `bearing_degrees` for
/// `distance_meters` on a spherical Earth.
///
/// Returns `(lat, lon)` in degrees.
///
/// # Example
///
/// ```rust
/// use route_poi::geo_utils::{destination_point, haversine_distance_and_bearing};
///
/// let (lat, lon) = destination_point(10.0, 106.0, 45.0, 250.0);
/// let (distance, bearing) = haversine_distance_and_bearing(10.0, 106.0, lat, lon);
/// assert!((distance - 250.0).abs() < 0.01);
/// assert!((bearing - 45.0).abs() < 0.01);
/// ```
pub fn destination_point(
    lat: f64,
    lon: f64,
    bearing_degrees: f64,
    distance_meters: f64,
) -> (f64, f64) {
    let origin = Point::new(lon, lat);
    // Same angular distance on geo's sphere
    let geo_distance = distance_meters / TO_EARTH_RADIUS;
    let projected = Haversine::destination(origin, bearing_degrees, geo_distance);
    (projected.y(), projected.x())
}

// =============================================================================
// Center/Centroid Functions
// =============================================================================

/// Arithmetic mean of latitudes and longitudes.
///
/// Returns `None` for empty input. Suitable for the small spreads of repeated
/// observations of one POI; it does not handle antimeridian wrap-around.
pub fn compute_center(points: &[GpsPoint]) -> Option<GpsPoint> {
    if points.is_empty() {
        return None;
    }

    let sum_lat: f64 = points.iter().map(|p| p.latitude).sum();
    let sum_lng: f64 = points.iter().map(|p| p.longitude).sum();
    let n = points.len() as f64;

    Some(GpsPoint::new(sum_lat / n, sum_lng / n))
}

// =============================================================================
// Unit Tests
// =============================================================================
