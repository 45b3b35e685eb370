//! Live vehicle feed error types.

/// Errors that can occur when polling vehicle positions.
#[derive(Debug, thiserror::Error)]
pub enum VehicleError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },
}
