//! Geographic positions and great-circle distance.

use std::fmt;

use serde::Serialize;

/// Mean Earth radius used for haversine distances, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Fixed-point scale for cache-key quantization: four decimal places of a degree (~11 m).
const QUANTIZE_SCALE: f64 = 10_000.0;

/// A latitude/longitude pair in degrees.
///
/// Both coordinates are finite by construction. Non-numeric input (NaN or
/// infinities) yields `None` from [`Position::new`], so callers treat it as
/// "no position given".
///
/// # Examples
///
/// ```
/// use transit_server::domain::Position;
///
/// let p = Position::new(51.1079, 17.0385).unwrap();
/// assert_eq!(p.distance_km(&p), 0.0);
///
/// assert!(Position::new(f64::NAN, 17.0).is_none());
/// ```
#[derive(Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    lat: f64,
    lon: f64,
}

impl Position {
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        if lat.is_finite() && lon.is_finite() {
            Some(Self { lat, lon })
        } else {
            None
        }
    }

    /// Build a position from optional query parameters.
    ///
    /// Both coordinates must be present and finite.
    pub fn from_parts(lat: Option<f64>, lon: Option<f64>) -> Option<Self> {
        Self::new(lat?, lon?)
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Great-circle distance to `other` in kilometres.
    pub fn distance_km(&self, other: &Position) -> f64 {
        haversine_km(self.lat, self.lon, other.lat, other.lon)
    }

    /// Round both coordinates to four decimal places.
    pub fn quantize(&self) -> QuantizedPosition {
        QuantizedPosition {
            lat: (self.lat * QUANTIZE_SCALE).round() as i64,
            lon: (self.lon * QUANTIZE_SCALE).round() as i64,
        }
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position({}, {})", self.lat, self.lon)
    }
}

/// A position rounded to 1e-4 degrees, usable as a hash key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuantizedPosition {
    lat: i64,
    lon: i64,
}

/// Haversine distance between two coordinates given in degrees.
///
/// Returns NaN if any coordinate is NaN; callers filter those out.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let half_lat = (d_lat / 2.0).sin();
    let half_lon = (d_lon / 2.0).sin();
    let a = half_lat * half_lat
        + lat1.to_radians().cos() * lat2.to_radians().cos() * half_lon * half_lon;
    // Rounding can push `a` a hair above 1 near antipodes
    let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());
    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(lat: f64, lon: f64) -> Position {
        Position::new(lat, lon).unwrap()
    }

    #[test]
    fn rejects_non_finite() {
        assert!(Position::new(f64::NAN, 0.0).is_none());
        assert!(Position::new(0.0, f64::INFINITY).is_none());
        assert!(Position::new(f64::NEG_INFINITY, 0.0).is_none());
        assert!(Position::new(0.0, 0.0).is_some());
    }

    #[test]
    fn from_parts_needs_both() {
        assert!(Position::from_parts(Some(51.0), None).is_none());
        assert!(Position::from_parts(None, Some(17.0)).is_none());
        assert!(Position::from_parts(Some(51.0), Some(17.0)).is_some());
    }

    #[test]
    fn known_distance() {
        // Wrocław Rynek to Warsaw Palace of Culture, roughly 301 km
        let wroclaw = pos(51.1100, 17.0320);
        let warsaw = pos(52.2318, 21.0060);
        let d = wroclaw.distance_km(&warsaw);
        assert!((d - 301.0).abs() < 5.0, "got {d}");
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = pos(0.0, 0.0).distance_km(&pos(1.0, 0.0));
        let expected = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;
        assert!((d - expected).abs() < 1e-9);
    }

    #[test]
    fn antipodes() {
        let d = pos(0.0, 0.0).distance_km(&pos(0.0, 180.0));
        assert!((d - EARTH_RADIUS_KM * std::f64::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn nan_propagates() {
        assert!(haversine_km(f64::NAN, 0.0, 0.0, 0.0).is_nan());
    }

    #[test]
    fn quantize_rounds_to_four_places() {
        assert_eq!(pos(51.12344, 17.00001).quantize(), pos(51.12341, 17.0).quantize());
        assert_ne!(pos(51.1234, 17.0).quantize(), pos(51.1235, 17.0).quantize());
    }

    #[test]
    fn debug_format() {
        assert_eq!(format!("{:?}", pos(1.5, -2.0)), "Position(1.5, -2)");
    }
}
