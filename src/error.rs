//! Typed errors for conditions callers handle rather than propagate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Still throttled after {attempts} attempts on {url}")]
    Throttled { url: String, attempts: u32 },
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Geocoding request failed: {0}")]
    Transport(#[from] wreq::Error),

    #[error("Geocoding service returned HTTP {0}")]
    Http(u16),

    #[error("Malformed geocoding response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Geocoding service status {status}: {message}")]
    Service { status: String, message: String },
}
