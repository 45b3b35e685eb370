//! Live vehicle positions.
//!
//! The operator's position endpoint is polled on a fixed interval for every
//! known tram and bus line; the latest classified reports are kept in memory.

mod client;
mod error;
mod positions;

pub use client::{DEFAULT_VEHICLES_URL, VehicleClient, VehicleClientConfig};
pub use error::VehicleError;
pub use positions::{Vehicle, VehiclePositions, VehicleSnapshot};
