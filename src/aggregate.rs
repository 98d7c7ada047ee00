//! Observation aggregation.
//!
//! Turns the raw nearby-search results collected at every route point into
//! [`ProcessedPoiRecord`]s:
//!
//! 1. Compute the bearing of every route segment
//! 2. For each (route point, POI) pair compute distance, bearing and side
//! 3. Drop exact repeats of `(source, poi position, name)`
//! 4. Resolve one consensus side per POI name by majority vote and record
//!    every route point that saw the same name
//!
//! Records are later filtered by side and grouped by name with
//! [`group_by_name`] before fuzzy merging and optimization.

use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{PoiError, Result};
use crate::geo_utils::haversine_distance_and_bearing;
use crate::side::{determine_side, majority_side, route_heading_at, segment_bearings, Side};
use crate::{GpsPoint, GroupMember, PoiGroup, RouteObservation, RoutePoint};

// ============================================================================
// Input Types
// ============================================================================

/// One POI returned by the nearby search around a route point.
///
/// Every field may be missing. An entry with no name and no coordinates is a
/// "nothing found here" placeholder and is dropped silently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPoiObservation {
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub types: Vec<String>,
}

impl RawPoiObservation {
    /// Create a fully populated observation.
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: Some(name.into()),
            latitude: Some(latitude),
            longitude: Some(longitude),
            types: Vec::new(),
        }
    }

    /// Attach place types (e.g. `"point"`, `"cafe"`).
    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = types.into_iter().map(Into::into).collect();
        self
    }

    /// True for the "no POIs found" marker entry.
    pub fn is_placeholder(&self) -> bool {
        self.name.is_none() && self.latitude.is_none() && self.longitude.is_none()
    }

    /// Name and position, or the reason the observation cannot be placed.
    fn resolve(&self, sequence_index: usize) -> Result<(&str, GpsPoint)> {
        let name = self
            .name
            .as_deref()
            .filter(|n| !n.is_empty())
            .ok_or(PoiError::MissingField { sequence_index, field: "name" })?;
        let latitude = self
            .latitude
            .ok_or(PoiError::MissingField { sequence_index, field: "latitude" })?;
        let longitude = self
            .longitude
            .ok_or(PoiError::MissingField { sequence_index, field: "longitude" })?;

        let position = GpsPoint::new(latitude, longitude);
        if !position.is_valid() {
            return Err(PoiError::InvalidCoordinates {
                sequence_index,
                name: name.to_string(),
                latitude,
                longitude,
            });
        }

        Ok((name, position))
    }
}

/// Nearby-search response body as returned by the places API.
///
/// Only the fields the pipeline consumes are modelled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NearbySearchResponse {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub result: Vec<NearbyPlace>,
}

/// A single place inside a [`NearbySearchResponse`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NearbyPlace {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<PlaceLocation>,
    #[serde(default)]
    pub types: Option<Vec<String>>,
}

/// Place coordinates. The API spells longitude `lng`; older payloads use `lon`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PlaceLocation {
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default, alias = "lon")]
    pub lng: Option<f64>,
}

impl NearbySearchResponse {
    /// Decode a response body.
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| PoiError::MalformedPayload(e.to_string()))
    }

    /// Whether the API reported success.
    pub fn is_ok(&self) -> bool {
        self.code == "ok"
    }

    /// Convert the returned places into raw observations.
    pub fn into_observations(self) -> Vec<RawPoiObservation> {
        self.result.into_iter().map(RawPoiObservation::from).collect()
    }
}

impl From<NearbyPlace> for RawPoiObservation {
    fn from(place: NearbyPlace) -> Self {
        let location = place.location.unwrap_or_default();
        Self {
            name: place.name,
            latitude: location.lat,
            longitude: location.lng,
            types: place.types.unwrap_or_default(),
        }
    }
}

impl RouteObservation {
    /// Pair a route point with the places found around it.
    ///
    /// A response whose `code` is not `"ok"` contributes no places; the route
    /// point is kept since it still shapes the route heading.
    pub fn from_response(point: RoutePoint, response: NearbySearchResponse) -> Self {
        let nearby = if response.is_ok() {
            response.into_observations()
        } else {
            warn!(
                "[Aggregator] Nearby search at route point {} returned code '{}'",
                point.sequence_index, response.code
            );
            Vec::new()
        };
        Self { point, nearby }
    }
}

// ============================================================================
// Processed Records
// ============================================================================

/// A POI observation placed relative to the route point that saw it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedPoiRecord {
    pub source_lat: f64,
    pub source_lon: f64,
    pub poi_name: String,
    pub poi_lat: f64,
    pub poi_lon: f64,
    /// Distance from the route point to the POI in meters
    pub distance: f64,
    /// Bearing from the route point to the POI in degrees
    pub bearing: f64,
    /// Per-observation side, replaced by the consensus side when the name was
    /// seen more than once
    pub side: Side,
    /// Place types reported by the search, duplicates removed
    pub all_types: Vec<String>,
    /// Every route point that observed this POI name, in observation order
    pub shared_with: Vec<GpsPoint>,
}

impl ProcessedPoiRecord {
    pub fn source(&self) -> GpsPoint {
        GpsPoint::new(self.source_lat, self.source_lon)
    }

    pub fn poi(&self) -> GpsPoint {
        GpsPoint::new(self.poi_lat, self.poi_lon)
    }

    /// Group member view of this record.
    pub fn member(&self) -> GroupMember {
        GroupMember {
            side: self.side,
            source: self.source(),
            poi: self.poi(),
            bearing: self.bearing,
            distance: self.distance,
        }
    }
}

/// A single `(side, source)` vote for a POI name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sighting {
    pub side: Side,
    pub source: GpsPoint,
}

// ============================================================================
// Aggregator
// ============================================================================

/// Identity of a record: source, POI position and name, compared exactly.
type RecordKey = (u64, u64, u64, u64, String);

/// Bit pattern used for exact coordinate comparison (`-0.0` equals `0.0`).
#[inline]
fn coordinate_bits(value: f64) -> u64 {
    if value == 0.0 {
        0.0f64.to_bits()
    } else {
        value.to_bits()
    }
}

fn record_key(source: &GpsPoint, poi: &GpsPoint, name: &str) -> RecordKey {
    (
        coordinate_bits(source.latitude),
        coordinate_bits(source.longitude),
        coordinate_bits(poi.latitude),
        coordinate_bits(poi.longitude),
        name.to_string(),
    )
}

/// Incremental builder for processed records.
///
/// Owns the identity set used for deduplication and the per-name vote lists
/// used to resolve consensus sides.
///
/// # Example
///
/// ```rust
/// use route_poi::{ObservationAggregator, RawPoiObservation, RoutePoint, Side};
///
/// let mut aggregator = ObservationAggregator::new();
/// let source = RoutePoint::new(10.0, 106.0, 0);
/// let cafe = RawPoiObservation::new("Cafe", 10.0005, 106.001);
///
/// // Heading due north; the cafe is north-east of the route point
/// assert_eq!(aggregator.ingest(&source, 0.0, &cafe), Ok(true));
/// assert_eq!(aggregator.ingest(&source, 0.0, &cafe), Ok(false)); // exact repeat
///
/// let records = aggregator.finish();
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].side, Side::Right);
/// ```
#[derive(Debug, Default)]
pub struct ObservationAggregator {
    seen: HashSet<RecordKey>,
    records: Vec<ProcessedPoiRecord>,
    name_index: HashMap<String, usize>,
    sightings: Vec<Vec<Sighting>>,
}

impl ObservationAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place one observation seen from `source` while travelling along
    /// `route_bearing`.
    ///
    /// Returns `Ok(true)` when a new record was created, `Ok(false)` for
    /// placeholders and exact repeats, and an error when a field needed to
    /// place the POI is missing or invalid.
    pub fn ingest(
        &mut self,
        source: &RoutePoint,
        route_bearing: f64,
        raw: &RawPoiObservation,
    ) -> Result<bool> {
        if raw.is_placeholder() {
            return Ok(false);
        }

        let (name, poi) = raw.resolve(source.sequence_index)?;
        let origin = source.point();

        let key = record_key(&origin, &poi, name);
        if self.seen.contains(&key) {
            debug!(
                "[Aggregator] Duplicate '{}' at route point {}",
                name, source.sequence_index
            );
            return Ok(false);
        }

        let (distance, poi_bearing) = haversine_distance_and_bearing(
            origin.latitude,
            origin.longitude,
            poi.latitude,
            poi.longitude,
        );
        let side = determine_side(poi_bearing, route_bearing);

        let mut all_types: Vec<String> = Vec::with_capacity(raw.types.len());
        for t in &raw.types {
            if !all_types.contains(t) {
                all_types.push(t.clone());
            }
        }

        self.seen.insert(key);
        self.records.push(ProcessedPoiRecord {
            source_lat: origin.latitude,
            source_lon: origin.longitude,
            poi_name: name.to_string(),
            poi_lat: poi.latitude,
            poi_lon: poi.longitude,
            distance,
            bearing: poi_bearing,
            side,
            all_types,
            shared_with: Vec::new(),
        });

        let slot = match self.name_index.get(name) {
            Some(&slot) => slot,
            None => {
                self.sightings.push(Vec::new());
                let slot = self.sightings.len() - 1;
                self.name_index.insert(name.to_string(), slot);
                slot
            }
        };
        self.sightings[slot].push(Sighting { side, source: origin });

        Ok(true)
    }

    /// Number of distinct records ingested so far.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Votes collected for a POI name.
    pub fn sightings(&self, name: &str) -> Option<&[Sighting]> {
        self.name_index
            .get(name)
            .map(|&slot| self.sightings[slot].as_slice())
    }

    /// Resolve consensus sides and shared sources, returning all records in
    /// creation order.
    pub fn finish(self) -> Vec<ProcessedPoiRecord> {
        let Self {
            records,
            name_index,
            sightings,
            ..
        } = self;

        records
            .into_iter()
            .map(|mut record| {
                if let Some(&slot) = name_index.get(&record.poi_name) {
                    let votes = &sightings[slot];
                    if votes.len() > 1 {
                        record.side = majority_side(votes.iter().map(|v| v.side));
                    }
                    record.shared_with = votes.iter().map(|v| v.source).collect();
                }
                record
            })
            .collect()
    }
}

/// Process the observations collected along a route.
///
/// Routes with fewer than two points have no heading and yield no records.
/// Malformed observations are skipped with a warning.
///
/// # Example
///
/// ```rust
/// use route_poi::{aggregate_observations, RawPoiObservation, RouteObservation, RoutePoint, Side};
///
/// let route = vec![
///     RouteObservation::new(
///         RoutePoint::new(10.0, 106.0, 0),
///         vec![RawPoiObservation::new("Pharmacy", 10.0005, 106.001)],
///     ),
///     RouteObservation::new(RoutePoint::new(10.001, 106.0, 1), vec![]),
/// ];
///
/// let records = aggregate_observations(&route);
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].side, Side::Right);
/// ```
pub fn aggregate_observations(route: &[RouteObservation]) -> Vec<ProcessedPoiRecord> {
    let points: Vec<RoutePoint> = route.iter().map(|obs| obs.point).collect();
    let bearings = segment_bearings(&points);

    if bearings.is_empty() {
        info!(
            "[Aggregator] Route has {} point(s), no heading available",
            points.len()
        );
        return vec![];
    }

    let mut aggregator = ObservationAggregator::new();
    let mut skipped = 0usize;

    for (i, obs) in route.iter().enumerate() {
        let Some(heading) = route_heading_at(&bearings, i) else {
            continue;
        };

        for raw in &obs.nearby {
            if let Err(e) = aggregator.ingest(&obs.point, heading, raw) {
                warn!("[Aggregator] Skipping observation: {}", e);
                skipped += 1;
            }
        }
    }

    info!(
        "[Aggregator] {} records from {} route points ({} skipped)",
        aggregator.record_count(),
        route.len(),
        skipped
    );

    aggregator.finish()
}

/// Group records by POI name, keeping only those on `side` when given.
///
/// Groups appear in the order their name was first encountered; members keep
/// record order.
pub fn group_by_name(records: &[ProcessedPoiRecord], side: Option<Side>) -> Vec<PoiGroup> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<PoiGroup> = Vec::new();

    let kept = records.iter().filter(|r| match side {
        Some(s) => r.side == s,
        None => true,
    });

    for record in kept {
        let slot = *index.entry(record.poi_name.as_str()).or_insert_with(|| {
            groups.push(PoiGroup::new(record.poi_name.clone()));
            groups.len() - 1
        });
        groups[slot].members.push(record.member());
    }

    groups
}

// ============================================================================
// Tests
// ============================================================================
