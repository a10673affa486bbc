//! kijiji-map - Scrape Kijiji apartment listings and plot them on a map
//!
//! A sequential pipeline: enumerate results pages, extract listing cards,
//! fetch each listing's details, geocode its address, drop excluded or
//! over-budget listings, and render the rest onto a static HTML map.

pub mod commands;
pub mod config;
pub mod error;
pub mod filters;
pub mod geocode;
pub mod pagination;
pub mod render;
pub mod site;
pub mod throttle;

pub use config::{Config, Secrets};
pub use filters::{accept, ExclusionSet};
pub use pagination::{PageCount, PageUrls};
pub use site::{Coordinates, Listing};
