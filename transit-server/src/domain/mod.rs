//! Domain types for the transit line server.
//!
//! Line classification and geographic positions. Both are pure and have no
//! dependency on the loaded feed.

mod category;
mod position;

pub use category::{Bucket, CategorizedLines, Category, Family, UnknownBucket, classify};
pub use position::{EARTH_RADIUS_KM, Position, QuantizedPosition, haversine_km};
