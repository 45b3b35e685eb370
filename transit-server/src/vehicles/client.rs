//! Vehicle position endpoint client.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::domain::{Bucket, CategorizedLines};

use super::error::VehicleError;

/// Default vehicle position endpoint (MPK Wrocław).
pub const DEFAULT_VEHICLES_URL: &str = "https://mpk.wroc.pl/bus_position";

/// One raw report as returned by the endpoint.
///
/// The endpoint names latitude `x` and longitude `y`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VehicleDto {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

/// Configuration for the vehicle client.
#[derive(Debug, Clone)]
pub struct VehicleClientConfig {
    /// Position endpoint URL
    pub url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl VehicleClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: 10,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for VehicleClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_VEHICLES_URL)
    }
}

/// Client for the live position endpoint.
#[derive(Debug, Clone)]
pub struct VehicleClient {
    http: reqwest::Client,
    url: String,
}

impl VehicleClient {
    pub fn new(config: VehicleClientConfig) -> Result<Self, VehicleError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            url: config.url,
        })
    }

    /// Fetch current positions of every tram and bus line in `lines`.
    pub async fn fetch(&self, lines: &CategorizedLines) -> Result<Vec<VehicleDto>, VehicleError> {
        let form = request_form(lines);
        let response = self.http.post(&self.url).form(&form).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VehicleError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        let reports = parse_reports(&body)?;
        debug!(count = reports.len(), "fetched vehicle positions");
        Ok(reports)
    }
}

/// Form fields requesting every tram and bus line.
fn request_form(lines: &CategorizedLines) -> Vec<(&'static str, &str)> {
    let buses = lines
        .get(Bucket::AllBuses)
        .iter()
        .map(|line| ("busList[bus][]", line.as_str()));
    let trams = lines
        .get(Bucket::AllTrams)
        .iter()
        .map(|line| ("busList[tram][]", line.as_str()));
    buses.chain(trams).collect()
}

fn parse_reports(body: &str) -> Result<Vec<VehicleDto>, VehicleError> {
    serde_json::from_str(body).map_err(|e| VehicleError::Json {
        message: e.to_string(),
    })
}
