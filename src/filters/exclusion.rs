//! Operator-maintained exclusion list.

use super::{Filter, Rejection};
use crate::site::Listing;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Listing links that should never reach the map. Read once, never written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExclusionSet {
    links: HashSet<String>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a JSON array of listing URLs.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading exclusions from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read exclusion list: {}", path.display()))?;

        let links: Vec<String> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse exclusion list: {}", path.display()))?;

        debug!("Loaded {} exclusions", links.len());
        Ok(links.into_iter().collect())
    }

    pub fn contains(&self, link: &str) -> bool {
        self.links.contains(link)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl FromIterator<String> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self { links: iter.into_iter().map(|l| l.trim().to_string()).collect() }
    }
}

/// Rejects listings whose link is in the exclusion set.
pub struct ExclusionFilter {
    exclusions: ExclusionSet,
}

impl ExclusionFilter {
    pub fn new(exclusions: ExclusionSet) -> Self {
        Self { exclusions }
    }
}

impl Filter for ExclusionFilter {
    fn check(&self, listing: &Listing) -> Result<(), Rejection> {
        if self.exclusions.contains(&listing.link) {
            return Err(Rejection::Excluded);
        }
        Ok(())
    }

    fn description(&self) -> String {
        format!("Links: {} excluded", self.exclusions.len())
    }
}
