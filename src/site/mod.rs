//! Kijiji-specific modules for fetching, parsing, and listing models.

pub mod client;
pub mod extract;
pub mod models;
pub mod parser;
pub mod selectors;

pub use client::{KijijiClient, ListingSource};
pub use extract::{fetch_details, fetch_results_page, fetch_summaries};
pub use models::{Coordinates, Listing, ListingDetails, ListingSummary};
