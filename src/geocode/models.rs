//! Wire types for the Google Geocoding API.

use crate::site::Coordinates;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct GeocodeResponse {
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
    /// `OK`, `ZERO_RESULTS`, `OVER_QUERY_LIMIT`, `REQUEST_DENIED`, ...
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeResult {
    pub geometry: Geometry,
}

#[derive(Debug, Deserialize)]
pub struct Geometry {
    pub location: Location,
}

#[derive(Debug, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl GeocodeResponse {
    /// Coordinates of the first result.
    pub fn first_location(&self) -> Option<Coordinates> {
        self.results.first().map(|r| Coordinates::new(r.geometry.location.lat, r.geometry.location.lng))
    }

    /// True when the service reported a failure rather than an answer.
    pub fn is_error(&self) -> bool {
        matches!(self.status.as_deref(), Some(s) if s != "OK" && s != "ZERO_RESULTS")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ok_response() {
        let json = r#"{
            "results": [
                {"geometry": {"location": {"lat": 45.4231, "lng": -75.6831}, "location_type": "ROOFTOP"},
                 "formatted_address": "Parliament Hill"},
                {"geometry": {"location": {"lat": 1.0, "lng": 2.0}}}
            ],
            "status": "OK"
        }"#;
        let response: GeocodeResponse = serde_json::from_str(json).unwrap();
        assert!(!response.is_error());
        assert_eq!(response.first_location(), Some(Coordinates::new(45.4231, -75.6831)));
    }

    #[test]
    fn test_parse_zero_results() {
        let response: GeocodeResponse =
            serde_json::from_str(r#"{"results": [], "status": "ZERO_RESULTS"}"#).unwrap();
        assert!(!response.is_error());
        assert_eq!(response.first_location(), None);
    }

    #[test]
    fn test_parse_error_status() {
        let response: GeocodeResponse = serde_json::from_str(
            r#"{"results": [], "status": "OVER_QUERY_LIMIT", "error_message": "quota"}"#,
        )
        .unwrap();
        assert!(response.is_error());
        assert_eq!(response.error_message.as_deref(), Some("quota"));
    }

    #[test]
    fn test_missing_status_is_not_error() {
        let response: GeocodeResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert!(!response.is_error());
    }
}
