//! Listing acceptance: exclusion list and price ceiling.

pub mod exclusion;
pub mod price;

use crate::site::Listing;
use std::fmt;

pub use exclusion::{ExclusionFilter, ExclusionSet};
pub use price::{within_ceiling, PriceCeilingFilter};

/// Why a listing was kept off the map.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// Link is on the operator's exclusion list
    Excluded,
    /// No usable price on the listing page
    MissingPrice,
    /// Price above the configured ceiling
    OverCeiling { price: f64, ceiling: f64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Excluded => write!(f, "excluded"),
            Rejection::MissingPrice => write!(f, "no price"),
            Rejection::OverCeiling { price, ceiling } => {
                write!(f, "price out of range (${:.2} > ${:.2})", price, ceiling)
            }
        }
    }
}

/// Trait for filtering listings.
pub trait Filter: Send + Sync {
    /// Returns the reason `listing` fails this filter, if it does.
    fn check(&self, listing: &Listing) -> Result<(), Rejection>;

    /// Returns true if the listing passes the filter.
    fn matches(&self, listing: &Listing) -> bool {
        self.check(listing).is_ok()
    }

    /// Returns a description of this filter.
    fn description(&self) -> String;
}

/// A chain of filters that must all pass.
pub struct FilterChain {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    /// Creates an empty filter chain.
    pub fn new() -> Self {
        Self { filters: Vec::new() }
    }

    /// Adds a filter to the chain.
    pub fn add(&mut self, filter: impl Filter + 'static) -> &mut Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Returns the first rejection in chain order.
    pub fn check(&self, listing: &Listing) -> Result<(), Rejection> {
        self.filters.iter().try_for_each(|f| f.check(listing))
    }

    /// Checks if a listing passes all filters.
    pub fn matches(&self, listing: &Listing) -> bool {
        self.check(listing).is_ok()
    }

    /// Returns true if no filters are configured.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Returns the number of filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns descriptions of all filters.
    pub fn descriptions(&self) -> Vec<String> {
        self.filters.iter().map(|f| f.description()).collect()
    }

    /// The chain every run uses: exclusion list first, then price ceiling.
    pub fn standard(exclusions: ExclusionSet, ceiling: f64) -> Self {
        let mut chain = Self::new();
        chain.add(ExclusionFilter::new(exclusions));
        chain.add(PriceCeilingFilter::new(ceiling));
        chain
    }
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns true if `listing` belongs on the map: its link is not excluded and
/// it has a price no higher than `ceiling`.
pub fn accept(listing: &Listing, exclusions: &ExclusionSet, ceiling: f64) -> bool {
    !exclusions.contains(&listing.link)
        && listing.price.is_some_and(|price| within_ceiling(price, ceiling))
}
