//! Position optimization for POI groups.
//!
//! Each POI is usually seen from several route points, and the places API
//! reports slightly different coordinates each time. This module reduces a
//! [`PoiGroup`] to one position using a configurable strategy:
//!
//! | Strategy | Description |
//! |----------|-------------|
//! | [`Mean`](OptimizationStrategy::Mean) | Arithmetic mean of member positions |
//! | [`WeightedMean`](OptimizationStrategy::WeightedMean) | Inverse-distance weighted mean, favouring close observations |
//! | [`GeometricMedian`](OptimizationStrategy::GeometricMedian) | Weiszfeld iteration, robust to outliers |
//! | [`ClusterCenter`](OptimizationStrategy::ClusterCenter) | Densest mean-shift mode; keeps distinct POIs apart |
//! | [`BearingProjection`](OptimizationStrategy::BearingProjection) | Project from the minimum-bearing member by the average distance |
//!
//! Every strategy produces one [`OptimizedPoi`] per group and one
//! [`OptimizedRow`] per member observation.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{PoiError, Result};
use crate::geo_utils::{compute_center, destination_point};
use crate::mean_shift::{MeanShift, MeanShiftConfig};
use crate::{GpsPoint, GroupMember, PoiGroup};

/// How a group of observations is reduced to one position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationStrategy {
    Mean,
    WeightedMean,
    GeometricMedian,
    ClusterCenter,
    #[default]
    BearingProjection,
}

/// Configuration for position optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Strategy applied to every group. Default: bearing projection
    pub strategy: OptimizationStrategy,

    /// Added to distances before inverting them for weighted means, so a
    /// zero-distance observation does not divide by zero. Default: 1e-5
    pub weight_epsilon: f64,

    /// Iteration cap for the geometric median. Default: 100
    pub median_max_iterations: u32,

    /// Convergence threshold for the geometric median, in degrees.
    /// Default: 1e-5
    pub median_tolerance: f64,

    /// Mean-shift settings for the cluster-center strategy.
    pub mean_shift: MeanShiftConfig,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            strategy: OptimizationStrategy::default(),
            weight_epsilon: 1e-5,
            median_max_iterations: 100,
            median_tolerance: 1e-5,
            mean_shift: MeanShiftConfig::default(),
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.weight_epsilon.is_finite() && self.weight_epsilon > 0.0) {
            return Err(PoiError::InvalidConfig(format!(
                "weight_epsilon must be positive, got {}",
                self.weight_epsilon
            )));
        }
        if !(self.median_tolerance.is_finite() && self.median_tolerance > 0.0) {
            return Err(PoiError::InvalidConfig(format!(
                "median_tolerance must be positive, got {}",
                self.median_tolerance
            )));
        }
        if self.median_max_iterations == 0 {
            return Err(PoiError::InvalidConfig(
                "median_max_iterations must be at least 1".to_string(),
            ));
        }
        self.mean_shift.validate()
    }
}

/// One optimized position per POI group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizedPoi {
    pub poi_name: String,
    pub optimal_lat: f64,
    pub optimal_lon: f64,
    /// Number of observations the position was computed from
    pub member_count: usize,
}

/// Result table row: one per source observation kept in a group.
///
/// Field order is the persisted column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizedRow {
    pub source_lat: f64,
    pub source_lon: f64,
    pub poi_name: String,
    pub optimal_lat: f64,
    pub optimal_lon: f64,
}

// ============================================================================
// Estimators
// ============================================================================

/// Arithmetic mean of `points`. `None` for empty input.
pub fn mean_position(points: &[GpsPoint]) -> Option<GpsPoint> {
    compute_center(points)
}

/// Mean of `points` weighted by `1 / (distance + epsilon)`.
///
/// Closer observations are usually more accurate. `None` for empty input or
/// mismatched lengths.
pub fn weighted_mean_position(
    points: &[GpsPoint],
    distances: &[f64],
    epsilon: f64,
) -> Option<GpsPoint> {
    if points.is_empty() || points.len() != distances.len() {
        return None;
    }

    let mut weight_sum = 0.0;
    let mut lat_sum = 0.0;
    let mut lon_sum = 0.0;
    for (p, d) in points.iter().zip(distances) {
        let w = 1.0 / (d + epsilon);
        weight_sum += w;
        lat_sum += w * p.latitude;
        lon_sum += w * p.longitude;
    }

    Some(GpsPoint::new(lat_sum / weight_sum, lon_sum / weight_sum))
}

/// Geometric median by iteratively reweighted least squares (Weiszfeld).
///
/// Starts at the arithmetic mean. Each iteration weights members by the
/// inverse of their distance to the current estimate, skipping members that
/// sit exactly on it. Stops when the estimate moves less than `tolerance` or
/// after `max_iterations`, returning the latest estimate either way.
///
/// # Example
///
/// ```rust
/// use route_poi::GpsPoint;
/// use route_poi::optimize::geometric_median;
///
/// let square = vec![
///     GpsPoint::new(10.0, 106.0),
///     GpsPoint::new(10.0, 106.002),
///     GpsPoint::new(10.002, 106.0),
///     GpsPoint::new(10.002, 106.002),
/// ];
/// let median = geometric_median(&square, 100, 1e-5).unwrap();
/// assert!((median.latitude - 10.001).abs() < 1e-4);
/// assert!((median.longitude - 106.001).abs() < 1e-4);
/// ```
pub fn geometric_median(
    points: &[GpsPoint],
    max_iterations: u32,
    tolerance: f64,
) -> Option<GpsPoint> {
    let mut estimate = compute_center(points)?;

    for iteration in 0..max_iterations {
        let mut weight_sum = 0.0;
        let mut lat_sum = 0.0;
        let mut lon_sum = 0.0;

        for p in points {
            let d = planar_distance(p, &estimate);
            if d == 0.0 {
                continue;
            }
            let w = 1.0 / d;
            weight_sum += w;
            lat_sum += w * p.latitude;
            lon_sum += w * p.longitude;
        }

        // Every member sits on the estimate
        if weight_sum == 0.0 {
            return Some(estimate);
        }

        let next = GpsPoint::new(lat_sum / weight_sum, lon_sum / weight_sum);
        let moved = planar_distance(&next, &estimate);
        estimate = next;

        if moved < tolerance {
            debug!("[Optimizer] Geometric median converged after {} iterations", iteration + 1);
            return Some(estimate);
        }
    }

    debug!("[Optimizer] Geometric median hit the {} iteration cap", max_iterations);
    Some(estimate)
}

/// Densest mean-shift mode of `points`.
///
/// Among equally dense modes the one with the largest latitude (then
/// longitude) wins. A single point is returned unchanged; if clustering
/// yields no center the arithmetic mean is used.
pub fn cluster_center_position(
    points: &[GpsPoint],
    config: &MeanShiftConfig,
) -> Option<GpsPoint> {
    match points {
        [] => None,
        [only] => Some(*only),
        _ => MeanShift::new(config.clone())
            .cluster_centers(points)
            .first()
            .map(|c| c.center)
            .or_else(|| compute_center(points)),
    }
}

/// Reconstruct a position from bearings and distances.
///
/// The member with the smallest bearing (the first one on ties) is the
/// anchor. The result is the anchor's reported POI position projected along
/// the anchor's bearing by the mean distance of all members.
pub fn bearing_projection(members: &[GroupMember]) -> Option<GpsPoint> {
    let anchor = members
        .iter()
        .reduce(|best, m| if m.bearing < best.bearing { m } else { best })?;

    let average_distance = members.iter().map(|m| m.distance).sum::<f64>() / members.len() as f64;
    let (lat, lon) = destination_point(
        anchor.poi.latitude,
        anchor.poi.longitude,
        anchor.bearing,
        average_distance,
    );

    Some(GpsPoint::new(lat, lon))
}

/// Euclidean distance in degree space.
#[inline]
fn planar_distance(a: &GpsPoint, b: &GpsPoint) -> f64 {
    (a.latitude - b.latitude).hypot(a.longitude - b.longitude)
}

// ============================================================================
// Group Optimization
// ============================================================================

/// Compute the optimized position of one group.
///
/// Returns [`PoiError::InvalidConfig`] when `config` fails validation and
/// [`PoiError::EmptyGroup`] when the group has no members.
pub fn optimize_group(group: &PoiGroup, config: &OptimizerConfig) -> Result<OptimizedPoi> {
    config.validate()?;

    let position = match config.strategy {
        OptimizationStrategy::Mean => mean_position(&group.positions()),
        OptimizationStrategy::WeightedMean => {
            weighted_mean_position(&group.positions(), &group.distances(), config.weight_epsilon)
        }
        OptimizationStrategy::GeometricMedian => geometric_median(
            &group.positions(),
            config.median_max_iterations,
            config.median_tolerance,
        ),
        OptimizationStrategy::ClusterCenter => {
            cluster_center_position(&group.positions(), &config.mean_shift)
        }
        OptimizationStrategy::BearingProjection => bearing_projection(&group.members),
    }
    .ok_or_else(|| PoiError::EmptyGroup {
        name: group.name.clone(),
    })?;

    Ok(OptimizedPoi {
        poi_name: group.name.clone(),
        optimal_lat: position.latitude,
        optimal_lon: position.longitude,
        member_count: group.members.len(),
    })
}

/// One output row per member of `group`, all carrying `optimized`.
pub fn expand_rows(group: &PoiGroup, optimized: &OptimizedPoi) -> Vec<OptimizedRow> {
    group
        .members
        .iter()
        .map(|m| OptimizedRow {
            source_lat: m.source.latitude,
            source_lon: m.source.longitude,
            poi_name: optimized.poi_name.clone(),
            optimal_lat: optimized.optimal_lat,
            optimal_lon: optimized.optimal_lon,
        })
        .collect()
}

/// Optimize every group in order.
///
/// Empty groups are skipped, as is every group when `config` is invalid.
/// Returns the per-group positions and the expanded per-observation rows.
pub fn optimize_groups(
    groups: &[PoiGroup],
    config: &OptimizerConfig,
) -> (Vec<OptimizedPoi>, Vec<OptimizedRow>) {
    let results: Vec<Option<(OptimizedPoi, Vec<OptimizedRow>)>> =
        groups.iter().map(|g| optimize_with_rows(g, config)).collect();
    collect_results(results, config)
}

/// Optimize groups using parallel processing.
///
/// Same output (and order) as [`optimize_groups`], with each group handled
/// on the rayon pool. Worth it for long routes with many POIs.
#[cfg(feature = "parallel")]
pub fn optimize_groups_parallel(
    groups: &[PoiGroup],
    config: &OptimizerConfig,
) -> (Vec<OptimizedPoi>, Vec<OptimizedRow>) {
    use rayon::prelude::*;

    let results: Vec<Option<(OptimizedPoi, Vec<OptimizedRow>)>> =
        groups.par_iter().map(|g| optimize_with_rows(g, config)).collect();
    collect_results(results, config)
}

fn optimize_with_rows(
    group: &PoiGroup,
    config: &OptimizerConfig,
) -> Option<(OptimizedPoi, Vec<OptimizedRow>)> {
    match optimize_group(group, config) {
        Ok(optimized) => {
            let rows = expand_rows(group, &optimized);
            Some((optimized, rows))
        }
        Err(e @ PoiError::EmptyGroup { .. }) => {
            debug!("[Optimizer] {}", e);
            None
        }
        Err(e) => {
            warn!("[Optimizer] Skipping '{}': {}", group.name, e);
            None
        }
    }
}

fn collect_results(
    results: Vec<Option<(OptimizedPoi, Vec<OptimizedRow>)>>,
    config: &OptimizerConfig,
) -> (Vec<OptimizedPoi>, Vec<OptimizedRow>) {
    let mut optimized = Vec::with_capacity(results.len());
    let mut rows = Vec::new();
    for (poi, poi_rows) in results.into_iter().flatten() {
        optimized.push(poi);
        rows.extend(poi_rows);
    }

    info!(
        "[Optimizer] {} POIs, {} rows ({:?})",
        optimized.len(),
        rows.len(),
        config.strategy
    );

    (optimized, rows)
}

// ============================================================================
// Tests
// ============================================================================
