//! CLI command implementations.

pub mod pages;
pub mod scrape;

pub use pages::PagesCommand;
pub use scrape::{ScrapeCommand, ScrapeReport};
