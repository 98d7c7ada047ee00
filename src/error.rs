//! Error types for the POI pipeline.
//!
//! Every error here is local to a single observation, group, or configuration
//! value. Batch drivers log and skip rather than abort.

use thiserror::Error;

/// Errors raised by the side-detection and optimization stages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PoiError {
    /// An observation lacks one of the fields needed to place it.
    #[error("observation at route point {sequence_index} is missing {field}")]
    MissingField {
        sequence_index: usize,
        field: &'static str,
    },

    /// An observation carries coordinates that are not a valid WGS84 position.
    #[error("observation '{name}' at route point {sequence_index} has invalid coordinates ({latitude}, {longitude})")]
    InvalidCoordinates {
        sequence_index: usize,
        name: String,
        latitude: f64,
        longitude: f64,
    },

    /// A POI group reached the optimizer without any members.
    #[error("POI group '{name}' has no members")]
    EmptyGroup { name: String },

    /// A places API payload could not be decoded.
    #[error("malformed places payload: {0}")]
    MalformedPayload(String),

    /// A configuration value is out of range or could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, PoiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_display() {
        let err = PoiError::MissingField {
            sequence_index: 4,
            field: "latitude",
        };
        assert_eq!(
            err.to_string(),
            "observation at route point 4 is missing latitude"
        );
    }

    #[test]
    fn test_empty_group_display() {
        let err = PoiError::EmptyGroup {
            name: "Coffee House".to_string(),
        };
        assert!(err.to_string().contains("Coffee House"));
    }
}
