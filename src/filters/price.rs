//! Price ceiling filter.

use super::{Filter, Rejection};
use crate::site::Listing;

/// Keeps listings priced at or below a ceiling. Listings without a price are
/// rejected: they cannot be shown to be in range.
pub struct PriceCeilingFilter {
    ceiling: f64,
}

impl PriceCeilingFilter {
    pub fn new(ceiling: f64) -> Self {
        Self { ceiling }
    }
}

/// The single price comparison shared by the filter chain and [`super::accept`].
/// A NaN on either side never counts as within the ceiling.
pub fn within_ceiling(price: f64, ceiling: f64) -> bool {
    price <= ceiling
}

impl Filter for PriceCeilingFilter {
    fn check(&self, listing: &Listing) -> Result<(), Rejection> {
        let Some(price) = listing.price else {
            return Err(Rejection::MissingPrice);
        };

        if within_ceiling(price, self.ceiling) {
            Ok(())
        } else {
            Err(Rejection::OverCeiling { price, ceiling: self.ceiling })
        }
    }

    fn description(&self) -> String {
        format!("Price: <= ${:.2}", self.ceiling)
    }
}
