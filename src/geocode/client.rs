//! Geocoding client for the Google Geocoding API.

use super::models::GeocodeResponse;
use crate::error::GeocodeError;
use crate::site::Coordinates;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};
use wreq::Client;

const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Resolves free-text addresses to coordinates - enables mocking for tests.
///
/// Implementations never fail: any problem is reported as "no coordinates".
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Option<Coordinates>;
}

/// Google Geocoding API client. Every call hits the network; nothing is cached.
pub struct GoogleGeocoder {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl GoogleGeocoder {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_endpoint(api_key, GEOCODE_URL)
    }

    /// Creates a client against a custom endpoint (for testing).
    pub fn with_endpoint(api_key: impl Into<String>, endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build geocoding client")?;

        Ok(Self { client, api_key: api_key.into(), endpoint: endpoint.into() })
    }

    async fn lookup(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let url = format!(
            "{}?address={}&key={}",
            self.endpoint,
            urlencoding::encode(address),
            urlencoding::encode(&self.api_key)
        );

        let response = self.client.get(url.as_str()).header("Accept", "application/json").send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Http(status.as_u16()));
        }

        let body = response.text().await?;
        let parsed: GeocodeResponse = serde_json::from_str(&body)?;

        if parsed.is_error() {
            return Err(GeocodeError::Service {
                status: parsed.status.unwrap_or_default(),
                message: parsed.error_message.unwrap_or_default(),
            });
        }

        Ok(parsed.first_location())
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, address: &str) -> Option<Coordinates> {
        debug!("Geocoding: {}", address);

        match self.lookup(address).await {
            Ok(Some(coords)) => {
                debug!("Geocoded {} to ({}, {})", address, coords.lat, coords.lng);
                Some(coords)
            }
            Ok(None) => {
                debug!("No geocoding results for {}", address);
                None
            }
            Err(e) => {
                warn!("Geocoding failed for {}: {}", address, e);
                None
            }
        }
    }
}
