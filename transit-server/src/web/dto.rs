//! Data transfer objects for web requests and responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Position;
use crate::feed::{FeedStatus, StopScheduleEntry};
use crate::index::{RouteVariantSet, StopVisit, Variant};

/// Optional vehicle position on shape queries.
///
/// Values are kept as text so a malformed coordinate means "no position"
/// rather than a rejected request.
#[derive(Debug, Default, Deserialize)]
pub struct PositionQuery {
    pub lat: Option<String>,
    pub lon: Option<String>,
}

impl PositionQuery {
    /// Both coordinates, if present and finite.
    pub fn position(&self) -> Option<Position> {
        let parse = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<f64>().ok());
        Position::from_parts(parse(&self.lat), parse(&self.lon))
    }
}

/// One endpoint in the index listing.
#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub message: &'static str,
    pub endpoints: Vec<EndpointInfo>,
}

/// Service and feed health.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub feed: FeedStatus,
    pub generation: Option<u64>,
    pub loaded_at: Option<DateTime<Utc>>,
    pub last_attempt: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub total_lines: usize,
    pub indexed_lines: usize,
    pub variants: usize,
    pub shapes: usize,
    pub stops: usize,
    pub cached_resolutions: u64,
    pub locations_count: usize,
    pub locations_last_updated: Option<DateTime<Utc>>,
}

/// Lines of one category bucket.
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub category: String,
    pub lines: Vec<String>,
}

/// A bare shape point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointDto {
    pub lat: f64,
    pub lon: f64,
}

/// A stop on a variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopDto {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub arrival_time: String,
    pub departure_time: String,
}

impl From<&StopVisit> for StopDto {
    fn from(visit: &StopVisit) -> Self {
        Self {
            id: visit.stop_id.clone(),
            name: visit.stop_name.clone(),
            lat: visit.lat,
            lon: visit.lon,
            arrival_time: visit.arrival_time.clone(),
            departure_time: visit.departure_time.clone(),
        }
    }
}

fn shape_points(variant: &Variant) -> Vec<PointDto> {
    variant
        .points
        .iter()
        .map(|p| PointDto {
            lat: p.lat,
            lon: p.lon,
        })
        .collect()
}

fn stops(variant: &Variant) -> Vec<StopDto> {
    variant.stops.iter().map(StopDto::from).collect()
}

/// The variant chosen for a line.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeResponse {
    pub shape_points: Vec<PointDto>,
    pub stops: Vec<StopDto>,
    pub direction: String,
    pub headsign: String,
    pub shape_id: String,
}

impl From<&Variant> for ShapeResponse {
    fn from(variant: &Variant) -> Self {
        Self {
            shape_points: shape_points(variant),
            stops: stops(variant),
            direction: variant.direction.clone(),
            headsign: variant.headsign.clone(),
            shape_id: variant.shape_id.clone(),
        }
    }
}

/// One variant in a variant listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantDto {
    pub shape_id: String,
    pub direction: String,
    pub headsign: String,
    pub trip_count: usize,
    pub shape_points: Vec<PointDto>,
    pub stops: Vec<StopDto>,
}

impl From<&Variant> for VariantDto {
    fn from(variant: &Variant) -> Self {
        Self {
            shape_id: variant.shape_id.clone(),
            direction: variant.direction.clone(),
            headsign: variant.headsign.clone(),
            trip_count: variant.trip_count,
            shape_points: shape_points(variant),
            stops: stops(variant),
        }
    }
}

/// Every variant of a line.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantsResponse {
    pub route_short_name: String,
    pub route_id: String,
    pub variants: Vec<VariantDto>,
}

impl From<&RouteVariantSet> for VariantsResponse {
    fn from(set: &RouteVariantSet) -> Self {
        Self {
            route_short_name: set.short_name.clone(),
            route_id: set.route_id.clone(),
            variants: set.variants.iter().map(|v| VariantDto::from(v.as_ref())).collect(),
        }
    }
}

/// Stops of a line's default variant.
#[derive(Debug, Serialize)]
pub struct LineStopsResponse {
    pub line: String,
    pub stops: Vec<StopDto>,
}

/// One trip calling at a stop.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntryDto {
    pub route_id: Option<String>,
    pub trip_id: String,
    pub arrival_time: String,
    pub departure_time: String,
}

impl From<StopScheduleEntry> for ScheduleEntryDto {
    fn from(entry: StopScheduleEntry) -> Self {
        Self {
            route_id: entry.route_id,
            trip_id: entry.trip_id,
            arrival_time: entry.arrival_time,
            departure_time: entry.departure_time,
        }
    }
}

/// Schedule of one stop.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopScheduleResponse {
    pub stop_id: String,
    pub schedule: Vec<ScheduleEntryDto>,
}

/// Error response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_categories: Option<Vec<&'static str>>,
}
