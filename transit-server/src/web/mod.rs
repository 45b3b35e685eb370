//! Web layer for the transit server.
//!
//! JSON endpoints for line lists, live vehicle positions, line shapes and
//! stop schedules.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
