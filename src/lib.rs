//! # Route POI
//!
//! Side detection and position optimization for points of interest (POIs)
//! found along a GPS route.
//!
//! This library provides:
//! - Bearing, distance and projection helpers on the sphere
//! - Left/right classification of POIs relative to the direction of travel
//! - Deduplication and consensus-side voting across route points
//! - Fuzzy merging of POI groups with near-identical names
//! - Optimized POI positions from repeated noisy observations
//!
//! ## Features
//!
//! - **`parallel`** - Optimize POI groups in parallel with rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use route_poi::{run_pipeline, PipelineConfig, RawPoiObservation, RouteObservation, RoutePoint};
//!
//! // A short northbound route with a cafe to the east seen twice
//! let cafe = RawPoiObservation::new("Cafe 47", 10.0005, 106.0005);
//! let route = vec![
//!     RouteObservation::new(RoutePoint::new(10.0, 106.0, 0), vec![cafe.clone()]),
//!     RouteObservation::new(RoutePoint::new(10.0003, 106.0, 1), vec![cafe]),
//!     RouteObservation::new(RoutePoint::new(10.0006, 106.0, 2), vec![]),
//! ];
//!
//! let result = run_pipeline(&route, &PipelineConfig::default()).unwrap();
//! assert_eq!(result.optimized.len(), 1);
//! assert_eq!(result.rows.len(), 2); // one row per observing route point
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{PoiError, Result};

// Geographic utilities (bearing, distance, projection)
pub mod geo_utils;

// Left/right classification
pub mod side;
pub use side::{determine_side, majority_side, route_heading_at, segment_bearings, Side};

// Observation aggregation and deduplication
pub mod aggregate;
pub use aggregate::{
    aggregate_observations, group_by_name, NearbyPlace, NearbySearchResponse,
    ObservationAggregator, PlaceLocation, ProcessedPoiRecord, RawPoiObservation, Sighting,
};

// Fuzzy name merging
pub mod name_merge;
pub use name_merge::{fuzzy_ratio, merge_similar_groups, MergeMode};

// Position optimization
pub mod mean_shift;
pub use mean_shift::{estimate_bandwidth, MeanShift, MeanShiftConfig};

pub mod optimize;
#[cfg(feature = "parallel")]
pub use optimize::optimize_groups_parallel;
pub use optimize::{
    optimize_group, optimize_groups, OptimizationStrategy, OptimizedPoi, OptimizedRow,
    OptimizerConfig,
};

// Result table schemas
pub mod output;
pub use output::{route_line, OPTIMIZED_HEADER, PROCESSED_HEADER};

// End-to-end pipeline
pub mod pipeline;
pub use pipeline::{run_pipeline, PipelineConfig, PipelineResult};

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use route_poi::GpsPoint;
/// let point = GpsPoint::new(10.7769, 106.7009); // Ho Chi Minh City
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// A point on the route, in travel order.
///
/// The order of route points defines segment bearings, so `sequence_index`
/// must follow the direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub latitude: f64,
    pub longitude: f64,
    pub sequence_index: usize,
}

impl RoutePoint {
    pub fn new(latitude: f64, longitude: f64, sequence_index: usize) -> Self {
        Self {
            latitude,
            longitude,
            sequence_index,
        }
    }

    pub fn point(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }
}

/// The POIs the nearby search returned around one route point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteObservation {
    pub point: RoutePoint,
    #[serde(default)]
    pub nearby: Vec<RawPoiObservation>,
}

impl RouteObservation {
    pub fn new(point: RoutePoint, nearby: Vec<RawPoiObservation>) -> Self {
        Self { point, nearby }
    }
}

/// One observation of a POI inside a [`PoiGroup`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupMember {
    /// Consensus side of the record this member came from
    pub side: Side,
    /// Route point the POI was observed from
    pub source: GpsPoint,
    /// POI position as reported by the search
    pub poi: GpsPoint,
    /// Bearing from source to POI in degrees
    pub bearing: f64,
    /// Distance from source to POI in meters
    pub distance: f64,
}

/// Observations believed to describe the same physical POI.
///
/// Before merging every member carries `name`; after fuzzy merging `name` is
/// the canonical (seed) name and members may come from similar names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoiGroup {
    pub name: String,
    pub members: Vec<GroupMember>,
}

impl PoiGroup {
    /// Create an empty group.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// POI positions of all members.
    pub fn positions(&self) -> Vec<GpsPoint> {
        self.members.iter().map(|m| m.poi).collect()
    }

    /// Source-to-POI distances of all members.
    pub fn distances(&self) -> Vec<f64> {
        self.members.iter().map(|m| m.distance).collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gps_point_validation() {
        assert!(GpsPoint::new(10.7769, 106.7009).is_valid());
        assert!(!GpsPoint::new(91.0, 0.0).is_valid());
        assert!(!GpsPoint::new(0.0, 181.0).is_valid());
        assert!(!GpsPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_poi_group_accessors() {
        let mut group = PoiGroup::new("Cafe");
        group.members.push(GroupMember {
            side: Side::Right,
            source: GpsPoint::new(10.0, 106.0),
            poi: GpsPoint::new(10.0005, 106.001),
            bearing: 63.0,
            distance: 123.0,
        });
        assert_eq!(group.positions(), vec![GpsPoint::new(10.0005, 106.001)]);
        assert_eq!(group.distances(), vec![123.0]);
    }

    #[test]
    fn test_route_observation_from_json() {
        let json = r#"{"point": {"latitude": 10.0, "longitude": 106.0, "sequence_index": 0}}"#;
        let obs: RouteObservation = serde_json::from_str(json).unwrap();
        assert!(obs.nearby.is_empty());
        assert_eq!(obs.point.point(), GpsPoint::new(10.0, 106.0));
    }
}
