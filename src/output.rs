//! Result table schemas.
//!
//! Column order is part of the contract with the table writer and the map
//! renderer, so both row types expose their fields as ordered strings.

use crate::aggregate::ProcessedPoiRecord;
use crate::optimize::OptimizedRow;
use crate::GpsPoint;

/// Columns of the side-detection table.
pub const PROCESSED_HEADER: [&str; 10] = [
    "source_lat",
    "source_lon",
    "poi_name",
    "poi_lat",
    "poi_lon",
    "distance",
    "bearing",
    "side",
    "all_types",
    "shared_with",
];

/// Columns of the optimized-position table.
pub const OPTIMIZED_HEADER: [&str; 5] = [
    "source_lat",
    "source_lon",
    "poi_name",
    "optimal_lat",
    "optimal_lon",
];

impl ProcessedPoiRecord {
    /// Place types joined with `,`.
    pub fn types_label(&self) -> String {
        self.all_types.join(",")
    }

    /// Shared sources as `"lat, lon; lat, lon"`.
    pub fn shared_with_label(&self) -> String {
        self.shared_with
            .iter()
            .map(|p| format!("{}, {}", p.latitude, p.longitude))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Field values in [`PROCESSED_HEADER`] order.
    pub fn to_fields(&self) -> [String; 10] {
        [
            self.source_lat.to_string(),
            self.source_lon.to_string(),
            self.poi_name.clone(),
            self.poi_lat.to_string(),
            self.poi_lon.to_string(),
            self.distance.to_string(),
            self.bearing.to_string(),
            self.side.to_string(),
            self.types_label(),
            self.shared_with_label(),
        ]
    }
}

impl OptimizedRow {
    /// Field values in [`OPTIMIZED_HEADER`] order.
    pub fn to_fields(&self) -> [String; 5] {
        [
            self.source_lat.to_string(),
            self.source_lon.to_string(),
            self.poi_name.clone(),
            self.optimal_lat.to_string(),
            self.optimal_lon.to_string(),
        ]
    }
}

/// Route polyline as the map renderer draws it: distinct
/// `(source_lat, source_lon)` pairs in first-seen order.
pub fn route_line(rows: &[OptimizedRow]) -> Vec<GpsPoint> {
    let mut line: Vec<GpsPoint> = Vec::new();
    for row in rows {
        let point = GpsPoint::new(row.source_lat, row.source_lon);
        if !line.contains(&point) {
            line.push(point);
        }
    }
    line
}
