//! Route variants and positional resolution.

mod resolve;
mod variants;

pub use resolve::{Resolution, min_distance_km, resolve};
pub use variants::{RouteVariantSet, StopVisit, Variant, VariantIndex};
