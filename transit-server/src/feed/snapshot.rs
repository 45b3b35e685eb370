//! Typed feed tables.
//!
//! A [`Snapshot`] is the normalized, immutable content of one feed load.
//! Numeric columns are coerced here; text that does not parse becomes NaN
//! so that bad coordinates are excluded at the point of use rather than
//! dropping whole rows.

use std::collections::HashMap;

use serde::Serialize;

use super::archive::FeedTables;
use super::error::FeedError;
use super::table::Table;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub id: String,
    pub short_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trip {
    pub id: String,
    pub route_id: String,
    pub shape_id: Option<String>,
    pub headsign: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShapePoint {
    pub lat: f64,
    pub lon: f64,
    pub sequence: f64,
}

impl ShapePoint {
    pub fn has_finite_coords(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopTime {
    pub trip_id: String,
    pub stop_id: String,
    pub arrival_time: String,
    pub departure_time: String,
    pub sequence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// One trip calling at a stop, for per-stop schedules.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopScheduleEntry {
    pub route_id: Option<String>,
    pub trip_id: String,
    pub arrival_time: String,
    pub departure_time: String,
}

/// Normalized feed content.
#[derive(Debug, Default)]
pub struct Snapshot {
    routes: Vec<Route>,
    trips: Vec<Trip>,
    /// Points per shape id, sorted by sequence.
    shapes: HashMap<String, Vec<ShapePoint>>,
    /// Stop times in file order.
    stop_times: Vec<StopTime>,
    /// Indices into `stop_times` per trip, sorted by stop sequence.
    stop_times_by_trip: HashMap<String, Vec<usize>>,
    stops: HashMap<String, Stop>,
    trip_index: HashMap<String, usize>,
}

impl Snapshot {
    /// Normalize parsed feed tables.
    pub fn from_tables(mut tables: FeedTables) -> Result<Self, FeedError> {
        let routes = load_routes(&required(&mut tables, "routes")?);
        let trips = load_trips(&required(&mut tables, "trips")?);
        let shapes = load_shapes(&required(&mut tables, "shapes")?);
        let stop_times = load_stop_times(&required(&mut tables, "stop_times")?);
        let stops = load_stops(&required(&mut tables, "stops")?);

        let mut stop_times_by_trip: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, st) in stop_times.iter().enumerate() {
            stop_times_by_trip
                .entry(st.trip_id.clone())
                .or_default()
                .push(idx);
        }
        for indices in stop_times_by_trip.values_mut() {
            indices.sort_by(|&a, &b| stop_times[a].sequence.total_cmp(&stop_times[b].sequence));
        }

        let mut trip_index = HashMap::with_capacity(trips.len());
        for (idx, trip) in trips.iter().enumerate() {
            trip_index.entry(trip.id.clone()).or_insert(idx);
        }

        Ok(Self {
            routes,
            trips,
            shapes,
            stop_times,
            stop_times_by_trip,
            stops,
            trip_index,
        })
    }

    /// Routes in file order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Trips in file order.
    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn trip(&self, trip_id: &str) -> Option<&Trip> {
        self.trip_index.get(trip_id).map(|&idx| &self.trips[idx])
    }

    /// Points of a shape sorted by sequence, or `None` if the shape has no rows.
    pub fn shape(&self, shape_id: &str) -> Option<&[ShapePoint]> {
        self.shapes.get(shape_id).map(Vec::as_slice)
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Stop times of a trip sorted by stop sequence.
    pub fn stop_times_for_trip<'a>(
        &'a self,
        trip_id: &str,
    ) -> impl Iterator<Item = &'a StopTime> + use<'a> {
        self.stop_times_by_trip
            .get(trip_id)
            .into_iter()
            .flatten()
            .map(|&idx| &self.stop_times[idx])
    }

    pub fn stop(&self, stop_id: &str) -> Option<&Stop> {
        self.stops.get(stop_id)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    /// Every trip calling at a stop, in stop_times file order.
    ///
    /// Returns `None` if the stop id is not in the stops table.
    pub fn stop_schedule(&self, stop_id: &str) -> Option<Vec<StopScheduleEntry>> {
        self.stops.get(stop_id)?;

        let entries = self
            .stop_times
            .iter()
            .filter(|st| st.stop_id == stop_id)
            .map(|st| StopScheduleEntry {
                route_id: self.trip(&st.trip_id).map(|t| t.route_id.clone()),
                trip_id: st.trip_id.clone(),
                arrival_time: st.arrival_time.clone(),
                departure_time: st.departure_time.clone(),
            })
            .collect();

        Some(entries)
    }

    /// Non-empty route short names in file order.
    pub fn line_names(&self) -> impl Iterator<Item = &str> {
        self.routes
            .iter()
            .map(|r| r.short_name.as_str())
            .filter(|name| !name.is_empty())
    }
}

fn required(tables: &mut FeedTables, name: &'static str) -> Result<Table, FeedError> {
    tables.take(name).ok_or(FeedError::MissingTable(name))
}

fn load_routes(table: &Table) -> Vec<Route> {
    table
        .rows()
        .map(|row| Route {
            id: row.str("route_id").to_string(),
            short_name: row.str("route_short_name").to_string(),
        })
        .collect()
}

fn load_trips(table: &Table) -> Vec<Trip> {
    table
        .rows()
        .map(|row| Trip {
            id: row.str("trip_id").to_string(),
            route_id: row.str("route_id").to_string(),
            shape_id: row.non_empty("shape_id").map(str::to_string),
            headsign: row.non_empty("trip_headsign").map(str::to_string),
        })
        .collect()
}

fn load_shapes(table: &Table) -> HashMap<String, Vec<ShapePoint>> {
    let mut shapes: HashMap<String, Vec<ShapePoint>> = HashMap::new();
    for row in table.rows() {
        shapes
            .entry(row.str("shape_id").to_string())
            .or_default()
            .push(ShapePoint {
                lat: row.f64("shape_pt_lat"),
                lon: row.f64("shape_pt_lon"),
                sequence: row.f64("shape_pt_sequence"),
            });
    }

    // Sort by shape_pt_sequence, in case the file isn't in order
    for points in shapes.values_mut() {
        points.sort_by(|a, b| a.sequence.total_cmp(&b.sequence));
    }
    shapes
}

fn load_stop_times(table: &Table) -> Vec<StopTime> {
    table
        .rows()
        .map(|row| StopTime {
            trip_id: row.str("trip_id").to_string(),
            stop_id: row.str("stop_id").to_string(),
            arrival_time: row.str("arrival_time").to_string(),
            departure_time: row.str("departure_time").to_string(),
            sequence: row.f64("stop_sequence"),
        })
        .collect()
}

fn load_stops(table: &Table) -> HashMap<String, Stop> {
    let mut stops = HashMap::with_capacity(table.len());
    for row in table.rows() {
        let id = row.str("stop_id").to_string();
        // Keep the first definition of a duplicated stop id
        stops.entry(id.clone()).or_insert_with(|| Stop {
            id,
            name: row.str("stop_name").to_string(),
            lat: row.f64("stop_lat"),
            lon: row.f64("stop_lon"),
        });
    }
    stops
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Build feed tables from `(name, csv text)` pairs.
    pub fn tables(members: &[(&str, &str)]) -> FeedTables {
        FeedTables::from_tables(
            members
                .iter()
                .map(|(name, text)| (name.to_string(), Table::parse(name, text).unwrap())),
        )
    }

    /// Build a snapshot from the text of the five core tables.
    pub fn snapshot(
        routes: &str,
        trips: &str,
        shapes: &str,
        stop_times: &str,
        stops: &str,
    ) -> Snapshot {
        Snapshot::from_tables(tables(&[
            ("routes", routes),
            ("trips", trips),
            ("shapes", shapes),
            ("stop_times", stop_times),
            ("stops", stops),
        ]))
        .unwrap()
    }
}
