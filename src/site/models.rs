//! Data models for scraped listings and their enrichment.

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// One card on a search-results page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingSummary {
    /// Card title text
    pub title: String,
    /// Absolute URL of the listing page
    pub link: String,
    /// Short description shown on the card
    pub description: String,
}

/// Fields extracted from a listing's own page. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingDetails {
    /// Monthly rent
    pub price: Option<f64>,
    /// First line of the address block
    pub address: Option<String>,
    /// Posting date as displayed, not normalized
    pub posted_date: Option<String>,
}

/// A fully enriched listing, as handed to the filters and the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub title: String,
    /// Unique key within a run
    pub link: String,
    pub description: String,
    pub address: Option<String>,
    pub price: Option<f64>,
    pub coordinates: Option<Coordinates>,
    pub posted_date: Option<String>,
}

impl Listing {
    /// Merges a summary with its detail data and geocode result.
    pub fn assemble(
        summary: ListingSummary,
        details: ListingDetails,
        coordinates: Option<Coordinates>,
    ) -> Self {
        Self {
            title: summary.title,
            link: summary.link,
            description: summary.description,
            address: details.address,
            price: details.price,
            coordinates,
            posted_date: details.posted_date,
        }
    }

    /// Returns true if this listing can be placed on the map.
    pub fn has_marker(&self) -> bool {
        self.coordinates.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_summary() -> ListingSummary {
        ListingSummary {
            title: "Bright 1 bedroom".to_string(),
            link: "https://www.kijiji.ca/v-apartments-condos/ottawa/bright/1".to_string(),
            description: "Close to transit".to_string(),
        }
    }

    #[test]
    fn test_assemble_merges_all_fields() {
        let details = ListingDetails {
            price: Some(850.0),
            address: Some("123 Bank St, Ottawa, ON".to_string()),
            posted_date: Some("2 days ago".to_string()),
        };
        let coords = Coordinates::new(45.41, -75.69);

        let listing = Listing::assemble(make_summary(), details, Some(coords));
        assert_eq!(listing.title, "Bright 1 bedroom");
        assert_eq!(listing.link, "https://www.kijiji.ca/v-apartments-condos/ottawa/bright/1");
        assert_eq!(listing.description, "Close to transit");
        assert_eq!(listing.price, Some(850.0));
        assert_eq!(listing.address.as_deref(), Some("123 Bank St, Ottawa, ON"));
        assert_eq!(listing.posted_date.as_deref(), Some("2 days ago"));
        assert_eq!(listing.coordinates, Some(coords));
        assert!(listing.has_marker());
    }

    #[test]
    fn test_assemble_with_missing_details() {
        let listing = Listing::assemble(make_summary(), ListingDetails::default(), None);
        assert!(listing.price.is_none());
        assert!(listing.address.is_none());
        assert!(listing.posted_date.is_none());
        assert!(!listing.has_marker());
    }

    #[test]
    fn test_listing_serializes_coordinates_as_object() {
        let listing = Listing::assemble(
            make_summary(),
            ListingDetails { price: Some(700.0), ..Default::default() },
            Some(Coordinates::new(1.5, -2.5)),
        );
        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["coordinates"]["lat"], 1.5);
        assert_eq!(json["coordinates"]["lng"], -2.5);
        assert_eq!(json["price"], 700.0);
        assert!(json["address"].is_null());
    }
}
