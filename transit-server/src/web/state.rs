//! Application state for the web layer.

use crate::service::TransitService;
use crate::vehicles::VehiclePositions;

/// Shared application state.
///
/// Both members are cheap handles onto shared data.
#[derive(Clone)]
pub struct AppState {
    /// Feed-backed transit queries
    pub transit: TransitService,

    /// Latest live vehicle positions
    pub vehicles: VehiclePositions,
}

impl AppState {
    pub fn new(transit: TransitService, vehicles: VehiclePositions) -> Self {
        Self { transit, vehicles }
    }
}
