//! Latest vehicle positions.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::domain::{Category, classify};

use super::client::VehicleDto;

/// A classified vehicle report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vehicle {
    pub lat: f64,
    pub lon: f64,
    pub line: String,
    #[serde(rename = "type")]
    pub category: Category,
}

impl From<VehicleDto> for Vehicle {
    fn from(dto: VehicleDto) -> Self {
        Self {
            lat: dto.x,
            lon: dto.y,
            category: classify(&dto.name),
            line: dto.name,
        }
    }
}

/// Reports from the last successful poll.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleSnapshot {
    #[serde(rename = "locations")]
    pub vehicles: Vec<Vehicle>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Thread-safe holder of the latest vehicle positions.
#[derive(Clone, Default)]
pub struct VehiclePositions {
    inner: Arc<RwLock<Arc<VehicleSnapshot>>>,
}

impl VehiclePositions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all positions with a new set of reports.
    pub async fn update(&self, reports: Vec<VehicleDto>) -> usize {
        let snapshot = VehicleSnapshot {
            vehicles: reports.into_iter().map(Vehicle::from).collect(),
            last_updated: Some(Utc::now()),
        };
        let count = snapshot.vehicles.len();

        let mut guard = self.inner.write().await;
        *guard = Arc::new(snapshot);
        count
    }

    pub async fn snapshot(&self) -> Arc<VehicleSnapshot> {
        self.inner.read().await.clone()
    }
}
