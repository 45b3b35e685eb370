//! Best-variant selection for a line.

use std::sync::Arc;

use crate::domain::{Position, haversine_km};

use super::variants::{RouteVariantSet, Variant};

/// Outcome of resolving a line to one variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(Arc<Variant>),
    /// The line exists but no variant has usable geometry.
    NoGeometry,
    /// No route carries this short name.
    LineNotFound,
}

impl Resolution {
    pub fn found(&self) -> Option<&Arc<Variant>> {
        match self {
            Resolution::Found(variant) => Some(variant),
            _ => None,
        }
    }
}

/// Pick the variant of `set` that best matches `position`.
///
/// Without a position this is simply the first variant in encounter order.
/// With one, it is the variant whose closest shape point is nearest to the
/// position; on a tie the earlier variant wins. Points with non-finite
/// coordinates are ignored, and a variant without any finite point never
/// wins.
pub fn resolve(set: &RouteVariantSet, position: Option<Position>) -> Option<&Arc<Variant>> {
    let Some(position) = position else {
        return set.variants.first();
    };

    let mut best: Option<(&Arc<Variant>, f64)> = None;
    for variant in &set.variants {
        let distance = min_distance_km(variant, &position);
        if distance < best.map_or(f64::INFINITY, |(_, d)| d) {
            best = Some((variant, distance));
        }
    }
    best.map(|(variant, _)| variant)
}

/// Distance from `position` to the closest finite shape point of a variant.
///
/// Infinite when the variant has no finite point.
pub fn min_distance_km(variant: &Variant, position: &Position) -> f64 {
    variant
        .valid_points()
        .map(|p| haversine_km(position.lat(), position.lon(), p.lat, p.lon))
        .fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::ShapePoint;

    fn variant(shape_id: &str, points: &[(f64, f64)]) -> Arc<Variant> {
        Arc::new(Variant {
            shape_id: shape_id.to_string(),
            direction: String::new(),
            headsign: String::new(),
            trip_count: 1,
            trip_ids: vec![],
            points: points
                .iter()
                .enumerate()
                .map(|(i, &(lat, lon))| ShapePoint {
                    lat,
                    lon,
                    sequence: i as f64,
                })
                .collect(),
            stops: vec![],
        })
    }

    fn set(variants: Vec<Arc<Variant>>) -> RouteVariantSet {
        RouteVariantSet {
            route_id: "r".to_string(),
            short_name: "2".to_string(),
            variants,
        }
    }

    fn pos(lat: f64, lon: f64) -> Option<Position> {
        Position::new(lat, lon)
    }

    #[test]
    fn no_position_returns_first() {
        let s = set(vec![variant("S1", &[(51.0, 17.0)]), variant("S2", &[(51.0, 17.1)])]);
        assert_eq!(resolve(&s, None).unwrap().shape_id, "S1");
        // Stable across calls
        assert!(Arc::ptr_eq(resolve(&s, None).unwrap(), resolve(&s, None).unwrap()));
    }

    #[test]
    fn empty_set_resolves_to_none() {
        let s = set(vec![]);
        assert!(resolve(&s, None).is_none());
        assert!(resolve(&s, pos(51.0, 17.0)).is_none());
    }

    #[test]
    fn picks_nearest_variant() {
        let s = set(vec![
            variant("S1", &[(51.10, 17.00), (51.11, 17.00)]),
            variant("S2", &[(51.10, 17.07), (51.11, 17.07)]),
        ]);
        assert_eq!(resolve(&s, pos(51.105, 17.069)).unwrap().shape_id, "S2");
        assert_eq!(resolve(&s, pos(51.105, 17.001)).unwrap().shape_id, "S1");
    }

    #[test]
    fn ties_go_to_first_variant() {
        let s = set(vec![
            variant("S1", &[(51.10, 17.00)]),
            variant("S2", &[(51.10, 17.00)]),
        ]);
        assert_eq!(resolve(&s, pos(51.2, 17.0)).unwrap().shape_id, "S1");
    }

    #[test]
    fn nan_points_are_ignored() {
        let s = set(vec![
            variant("S1", &[(f64::NAN, 17.0), (51.50, 17.50)]),
            variant("S2", &[(51.20, 17.20)]),
        ]);
        // The NaN point of S1 must not count as "distance 0" or poison the minimum
        assert_eq!(resolve(&s, pos(51.49, 17.49)).unwrap().shape_id, "S1");
        assert_eq!(resolve(&s, pos(51.19, 17.19)).unwrap().shape_id, "S2");
    }

    #[test]
    fn variant_without_valid_points_never_wins() {
        let s = set(vec![
            variant("bad", &[(f64::NAN, f64::NAN)]),
            variant("good", &[(60.0, 20.0)]),
        ]);
        assert_eq!(resolve(&s, pos(51.0, 17.0)).unwrap().shape_id, "good");
        // Without a position encounter order still applies
        assert_eq!(resolve(&s, None).unwrap().shape_id, "bad");
    }

    #[test]
    fn all_invalid_resolves_to_none() {
        let s = set(vec![variant("bad", &[(f64::NAN, 17.0)])]);
        assert!(resolve(&s, pos(51.0, 17.0)).is_none());
    }

    #[test]
    fn min_distance_is_infinite_without_points() {
        let v = variant("empty", &[]);
        assert_eq!(min_distance_km(&v, &Position::new(0.0, 0.0).unwrap()), f64::INFINITY);
    }

    #[test]
    fn resolution_found_accessor() {
        let v = variant("S1", &[(51.0, 17.0)]);
        assert_eq!(Resolution::Found(v.clone()).found(), Some(&v));
        assert_eq!(Resolution::NoGeometry.found(), None);
        assert_eq!(Resolution::LineNotFound.found(), None);
    }
}
