//! Mean-shift mode seeking over POI observations.
//!
//! Used by [`OptimizationStrategy::ClusterCenter`](crate::OptimizationStrategy)
//! when one merged name may hide several real POIs: instead of averaging them
//! into a point between the shops, mean-shift finds the densest mode.
//!
//! ## Algorithm
//! 1. Estimate the kernel bandwidth as the mean distance from each point to
//!    its k-th nearest neighbour (`k = quantile * n`, at least 1, counting the
//!    point itself)
//! 2. Start one seed at every observation and repeatedly move it to the mean
//!    of all points within the bandwidth (flat kernel) until it moves less
//!    than `1e-3 * bandwidth`
//! 3. Rank converged seeds by how many points sat within their window,
//!    breaking ties by descending `(lat, lon)`
//! 4. Drop any center within the bandwidth of a stronger one
//!
//! Distances are Euclidean in degree space; POI spreads are a few hundred
//! meters at most. Neighbour queries go through an R-tree.

use log::debug;
use rstar::{PointDistance, RTree};
use serde::{Deserialize, Serialize};

use crate::error::{PoiError, Result};
use crate::GpsPoint;

/// Configuration for mean-shift clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeanShiftConfig {
    /// Kernel radius in degrees. Estimated from the data when `None`.
    pub bandwidth: Option<f64>,
    /// Fraction of points used as the neighbour count for bandwidth
    /// estimation. Default: 0.3
    pub quantile: f64,
    /// Maximum shifts per seed. Default: 300
    pub max_iterations: u32,
}

impl Default for MeanShiftConfig {
    fn default() -> Self {
        Self {
            bandwidth: None,
            quantile: 0.3,
            max_iterations: 300,
        }
    }
}

impl MeanShiftConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.quantile > 0.0 && self.quantile <= 1.0) {
            return Err(PoiError::InvalidConfig(format!(
                "mean-shift quantile must be in (0, 1], got {}",
                self.quantile
            )));
        }
        if let Some(bandwidth) = self.bandwidth {
            if !(bandwidth.is_finite() && bandwidth >= 0.0) {
                return Err(PoiError::InvalidConfig(format!(
                    "mean-shift bandwidth must be a non-negative number, got {}",
                    bandwidth
                )));
            }
        }
        if self.max_iterations == 0 {
            return Err(PoiError::InvalidConfig(
                "mean-shift max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Estimate a flat-kernel bandwidth for `points`.
///
/// Returns 0 for empty input and whenever every point coincides with its
/// k-th neighbour (e.g. fewer than four distinct observations at the default
/// quantile).
pub fn estimate_bandwidth(points: &[GpsPoint], quantile: f64) -> f64 {
    if points.is_empty() {
        return 0.0;
    }

    let k = ((points.len() as f64 * quantile) as usize).max(1);
    let tree = RTree::bulk_load(points.iter().map(to_coords).collect::<Vec<_>>());

    let total: f64 = points
        .iter()
        .map(|p| {
            let query = to_coords(p);
            tree.nearest_neighbor_iter(&query)
                .nth(k - 1)
                .map(|neighbour| neighbour.distance_2(&query).sqrt())
                .unwrap_or(0.0)
        })
        .sum();

    total / points.len() as f64
}

/// A converged mode and the number of points inside its final window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterCenter {
    pub center: GpsPoint,
    pub population: usize,
}

/// Mean-shift clusterer.
///
/// # Example
///
/// ```rust
/// use route_poi::{GpsPoint, MeanShift, MeanShiftConfig};
///
/// let points = vec![
///     GpsPoint::new(10.0000, 106.0000),
///     GpsPoint::new(10.0001, 106.0001),
///     GpsPoint::new(10.0000, 106.0001),
///     GpsPoint::new(10.0050, 106.0050), // outlier
/// ];
///
/// let config = MeanShiftConfig { bandwidth: Some(0.0005), ..Default::default() };
/// let centers = MeanShift::new(config).cluster_centers(&points);
/// assert_eq!(centers.len(), 2);
/// assert_eq!(centers[0].population, 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MeanShift {
    config: MeanShiftConfig,
}

impl MeanShift {
    pub fn new(config: MeanShiftConfig) -> Self {
        Self { config }
    }

    /// Bandwidth that will be used for `points`.
    pub fn bandwidth_for(&self, points: &[GpsPoint]) -> f64 {
        self.config
            .bandwidth
            .unwrap_or_else(|| estimate_bandwidth(points, self.config.quantile))
    }

    /// Cluster centers ordered by population, strongest first.
    ///
    /// Equal populations are ordered by descending latitude, then longitude.
    /// With a zero bandwidth every distinct position is its own mode, weighted
    /// by how often it repeats.
    pub fn cluster_centers(&self, points: &[GpsPoint]) -> Vec<ClusterCenter> {
        if points.is_empty() {
            return vec![];
        }

        let bandwidth = self.bandwidth_for(points);
        let radius_2 = bandwidth * bandwidth;
        let stop_threshold = 1e-3 * bandwidth;
        let tree = RTree::bulk_load(points.iter().map(to_coords).collect::<Vec<_>>());

        let mut modes: Vec<ClusterCenter> = points
            .iter()
            .filter_map(|seed| self.shift_seed(&tree, to_coords(seed), radius_2, stop_threshold))
            .collect();

        // Strongest first; ties go to the larger (lat, lon)
        modes.sort_by(|a, b| {
            b.population
                .cmp(&a.population)
                .then_with(|| b.center.latitude.total_cmp(&a.center.latitude))
                .then_with(|| b.center.longitude.total_cmp(&a.center.longitude))
        });

        let mut centers: Vec<ClusterCenter> = Vec::new();
        for mode in modes {
            let here = to_coords(&mode.center);
            let near_stronger = centers
                .iter()
                .any(|kept| to_coords(&kept.center).distance_2(&here) <= radius_2);
            if !near_stronger {
                centers.push(mode);
            }
        }

        debug!(
            "[MeanShift] {} points, bandwidth {:.6}, {} centers",
            points.len(),
            bandwidth,
            centers.len()
        );

        centers
    }

    /// Move one seed uphill until it settles. `None` if its window is empty.
    fn shift_seed(
        &self,
        tree: &RTree<[f64; 2]>,
        seed: [f64; 2],
        radius_2: f64,
        stop_threshold: f64,
    ) -> Option<ClusterCenter> {
        let mut mean = seed;
        let mut population = 0;

        for _ in 0..self.config.max_iterations {
            let mut sum = [0.0, 0.0];
            let mut count = 0usize;
            for p in tree.locate_within_distance(mean, radius_2) {
                sum[0] += p[0];
                sum[1] += p[1];
                count += 1;
            }
            if count == 0 {
                break;
            }

            let previous = mean;
            mean = [sum[0] / count as f64, sum[1] / count as f64];
            population = count;

            if mean.distance_2(&previous).sqrt() <= stop_threshold {
                break;
            }
        }

        (population > 0).then(|| ClusterCenter {
            center: GpsPoint::new(mean[0], mean[1]),
            population,
        })
    }
}

#[inline]
fn to_coords(p: &GpsPoint) -> [f64; 2] {
    [p.latitude, p.longitude]
}
