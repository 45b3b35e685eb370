//! Route variant index.
//!
//! Trips of a route are grouped by shape: every distinct shape is one
//! variant, i.e. one physical path the line runs. Variants keep the order in
//! which their shape ids were first seen while scanning trips, which is what
//! position-less resolution and tie-breaking rely on.

use std::collections::HashMap;
use std::sync::Arc;

use crate::feed::{ShapePoint, Snapshot, Trip};

/// A stop call on a variant's representative trip.
#[derive(Debug, Clone, PartialEq)]
pub struct StopVisit {
    pub stop_id: String,
    /// Empty when the stop id is missing from the stops table.
    pub stop_name: String,
    pub lat: f64,
    pub lon: f64,
    pub arrival_time: String,
    pub departure_time: String,
    pub sequence: f64,
}

/// One physical path of a line.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub shape_id: String,
    /// "First stop → last stop", or the headsign if no stop names are known.
    pub direction: String,
    /// Representative trip headsign, or the direction label.
    pub headsign: String,
    /// Number of trips running this shape.
    pub trip_count: usize,
    /// Ids of those trips, in encounter order.
    pub trip_ids: Vec<String>,
    /// Shape points sorted by sequence.
    pub points: Vec<ShapePoint>,
    /// Stop visits of the representative trip sorted by sequence.
    pub stops: Vec<StopVisit>,
}

impl Variant {
    /// Points with finite coordinates.
    pub fn valid_points(&self) -> impl Iterator<Item = &ShapePoint> {
        self.points.iter().filter(|p| p.has_finite_coords())
    }
}

/// All variants of one line.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteVariantSet {
    /// First route id carrying this short name.
    pub route_id: String,
    pub short_name: String,
    /// Variants in shape first-encounter order.
    pub variants: Vec<Arc<Variant>>,
}

impl RouteVariantSet {
    /// Whether the line has trips but no usable geometry.
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

/// Variant sets keyed by route short name.
#[derive(Debug, Default)]
pub struct VariantIndex {
    lines: HashMap<String, Arc<RouteVariantSet>>,
}

impl VariantIndex {
    /// Build the index for every line in the snapshot.
    ///
    /// Lines whose routes have no trips at all are left out, so a lookup can
    /// tell "unknown line" (`None`) from "line without geometry" (empty set).
    pub fn build(snapshot: &Snapshot) -> Self {
        // short name -> route ids, in route file order
        let mut line_routes: Vec<(&str, Vec<&str>)> = Vec::new();
        let mut line_pos: HashMap<&str, usize> = HashMap::new();
        for route in snapshot.routes() {
            if route.short_name.is_empty() {
                continue;
            }
            let pos = *line_pos.entry(route.short_name.as_str()).or_insert_with(|| {
                line_routes.push((route.short_name.as_str(), Vec::new()));
                line_routes.len() - 1
            });
            line_routes[pos].1.push(route.id.as_str());
        }

        // route id -> indices into the trips table
        let mut trips_by_route: HashMap<&str, Vec<usize>> = HashMap::new();
        for (idx, trip) in snapshot.trips().iter().enumerate() {
            trips_by_route
                .entry(trip.route_id.as_str())
                .or_default()
                .push(idx);
        }

        let mut lines = HashMap::with_capacity(line_routes.len());
        for (short_name, route_ids) in line_routes {
            let Some(set) = build_line(snapshot, short_name, &route_ids, &trips_by_route) else {
                continue;
            };
            lines.insert(short_name.to_string(), Arc::new(set));
        }

        Self { lines }
    }

    /// Variant set of a line, or `None` if the line has no trips.
    pub fn get(&self, line: &str) -> Option<&Arc<RouteVariantSet>> {
        self.lines.get(line)
    }

    /// Number of lines with at least one trip.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of variants across all lines.
    pub fn variant_count(&self) -> usize {
        self.lines.values().map(|set| set.variants.len()).sum()
    }
}

fn build_line(
    snapshot: &Snapshot,
    short_name: &str,
    route_ids: &[&str],
    trips_by_route: &HashMap<&str, Vec<usize>>,
) -> Option<RouteVariantSet> {
    // Trips of every route carrying this short name, in trip file order
    let mut trip_indices: Vec<usize> = route_ids
        .iter()
        .filter_map(|id| trips_by_route.get(id))
        .flatten()
        .copied()
        .collect();
    if trip_indices.is_empty() {
        return None;
    }
    trip_indices.sort_unstable();
    let trips = trip_indices.into_iter().map(|idx| &snapshot.trips()[idx]);

    // shape id -> trips, in shape first-encounter order
    let mut groups: Vec<(&str, Vec<&Trip>)> = Vec::new();
    let mut group_pos: HashMap<&str, usize> = HashMap::new();
    for trip in trips {
        let Some(shape_id) = trip.shape_id.as_deref() else {
            continue;
        };
        let pos = *group_pos.entry(shape_id).or_insert_with(|| {
            groups.push((shape_id, Vec::new()));
            groups.len() - 1
        });
        groups[pos].1.push(trip);
    }

    let variants = groups
        .into_iter()
        .filter_map(|(shape_id, trips)| build_variant(snapshot, shape_id, &trips))
        .map(Arc::new)
        .collect();

    Some(RouteVariantSet {
        route_id: route_ids[0].to_string(),
        short_name: short_name.to_string(),
        variants,
    })
}

fn build_variant(snapshot: &Snapshot, shape_id: &str, trips: &[&Trip]) -> Option<Variant> {
    // A shape without a single row has nothing to draw
    let points = snapshot.shape(shape_id)?.to_vec();
    let representative = trips.first()?;

    let stops: Vec<StopVisit> = snapshot
        .stop_times_for_trip(&representative.id)
        .map(|st| {
            let stop = snapshot.stop(&st.stop_id);
            StopVisit {
                stop_id: st.stop_id.clone(),
                stop_name: stop.map(|s| s.name.clone()).unwrap_or_default(),
                lat: stop.map_or(f64::NAN, |s| s.lat),
                lon: stop.map_or(f64::NAN, |s| s.lon),
                arrival_time: st.arrival_time.clone(),
                departure_time: st.departure_time.clone(),
                sequence: st.sequence,
            }
        })
        .collect();

    let direction = direction_label(&stops, representative.headsign.as_deref());
    let headsign = representative
        .headsign
        .clone()
        .unwrap_or_else(|| direction.clone());

    Some(Variant {
        shape_id: shape_id.to_string(),
        direction,
        headsign,
        trip_count: trips.len(),
        trip_ids: trips.iter().map(|t| t.id.clone()).collect(),
        points,
        stops,
    })
}

/// "First → Last" from stop names, falling back to the headsign when no
/// stop name is known at either end.
fn direction_label(stops: &[StopVisit], headsign: Option<&str>) -> String {
    let first = stops.first().map_or("", |s| s.stop_name.as_str());
    let last = stops.last().map_or("", |s| s.stop_name.as_str());

    match headsign {
        Some(headsign) if first.is_empty() && last.is_empty() => headsign.to_string(),
        _ => format!("{first} → {last}"),
    }
}
