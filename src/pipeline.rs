//! End-to-end POI pipeline.
//!
//! Raw nearby-search results → [`aggregate_observations`] → side filter and
//! [`group_by_name`] → [`merge_similar_groups`] →
//! [`optimize_groups`](crate::optimize::optimize_groups).

use log::info;
use serde::{Deserialize, Serialize};

use crate::aggregate::{aggregate_observations, group_by_name, ProcessedPoiRecord};
use crate::error::{PoiError, Result};
use crate::name_merge::{merge_similar_groups, MergeMode};
use crate::optimize::{OptimizedPoi, OptimizedRow, OptimizerConfig};
use crate::side::Side;
use crate::{PoiGroup, RouteObservation};

/// Configuration for a full pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Only records whose consensus side matches are optimized.
    /// Default: Right
    pub side_filter: Side,

    /// Names merge when their similarity (0-100) is strictly above this.
    /// Default: 85.0
    pub similarity_threshold: f64,

    /// Clustering mode for similar names. Default: greedy
    pub merge_mode: MergeMode,

    /// Position optimization settings.
    pub optimizer: OptimizerConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            side_filter: Side::Right,
            similarity_threshold: 85.0,
            merge_mode: MergeMode::Greedy,
            optimizer: OptimizerConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Example
    ///
    /// ```rust
    /// use route_poi::{OptimizationStrategy, PipelineConfig, Side};
    ///
    /// let config = PipelineConfig::from_json(
    ///     r#"{"side_filter": "Left", "optimizer": {"strategy": "geometric_median"}}"#,
    /// ).unwrap();
    /// assert_eq!(config.side_filter, Side::Left);
    /// assert_eq!(config.optimizer.strategy, OptimizationStrategy::GeometricMedian);
    /// assert_eq!(config.similarity_threshold, 85.0);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| PoiError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.similarity_threshold) {
            return Err(PoiError::InvalidConfig(format!(
                "similarity_threshold must be within 0..=100, got {}",
                self.similarity_threshold
            )));
        }
        self.optimizer.validate()
    }
}

/// Everything a pipeline run produces, stage by stage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineResult {
    /// Side-detection records for every distinct observation
    pub records: Vec<ProcessedPoiRecord>,
    /// Merged groups on the configured side
    pub groups: Vec<PoiGroup>,
    /// One optimized position per group
    pub optimized: Vec<OptimizedPoi>,
    /// One row per member observation
    pub rows: Vec<OptimizedRow>,
}

/// Run side detection, merging and optimization over a route.
///
/// Fails only on invalid configuration; bad observations are skipped and a
/// degenerate route produces an empty result.
pub fn run_pipeline(route: &[RouteObservation], config: &PipelineConfig) -> Result<PipelineResult> {
    config.validate()?;

    let records = aggregate_observations(route);
    let named = group_by_name(&records, Some(config.side_filter));
    let groups = merge_similar_groups(named, config.similarity_threshold, config.merge_mode);

    #[cfg(feature = "parallel")]
    let (optimized, rows) = crate::optimize::optimize_groups_parallel(&groups, &config.optimizer);

    #[cfg(not(feature = "parallel"))]
    let (optimized, rows) = crate::optimize::optimize_groups(&groups, &config.optimizer);

    info!(
        "[Pipeline] {} route points -> {} records -> {} {} POIs",
        route.len(),
        records.len(),
        optimized.len(),
        config.side_filter
    );

    Ok(PipelineResult {
        records,
        groups,
        optimized,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OptimizationStrategy, RawPoiObservation, RoutePoint};

    #[test]
    fn test_default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_from_json_defaults() {
        let config = PipelineConfig::from_json("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_from_json_rejects_bad_values() {
        assert!(matches!(
            PipelineConfig::from_json(r#"{"similarity_threshold": 150}"#),
            Err(PoiError::InvalidConfig(_))
        ));
        assert!(matches!(
            PipelineConfig::from_json(r#"{"optimizer": {"strategy": "median_of_medians"}}"#),
            Err(PoiError::InvalidConfig(_))
        ));
        assert!(PipelineConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_config_round_trip() {
        let config = PipelineConfig {
            side_filter: Side::Left,
            merge_mode: MergeMode::Transitive,
            optimizer: OptimizerConfig {
                strategy: OptimizationStrategy::ClusterCenter,
                ..Default::default()
            },
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(PipelineConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_run_rejects_invalid_config() {
        let config = PipelineConfig {
            similarity_threshold: -1.0,
            ..Default::default()
        };
        assert!(run_pipeline(&[], &config).is_err());
    }

    #[test]
    fn test_left_filter_keeps_left_pois() {
        let route = vec![
            RouteObservation::new(
                RoutePoint::new(10.0, 106.0, 0),
                vec![
                    RawPoiObservation::new("East Shop", 10.0005, 106.001),
                    RawPoiObservation::new("West Shop", 10.0005, 105.999),
                ],
            ),
            RouteObservation::new(RoutePoint::new(10.001, 106.0, 1), vec![]),
        ];
        let config = PipelineConfig {
            side_filter: Side::Left,
            ..Default::default()
        };

        let result = run_pipeline(&route, &config).unwrap();
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.optimized.len(), 1);
        assert_eq!(result.optimized[0].poi_name, "West Shop");
    }
}
