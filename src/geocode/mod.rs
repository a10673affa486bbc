//! Address geocoding.

pub mod client;
pub mod models;

pub use client::{Geocoder, GoogleGeocoder};
