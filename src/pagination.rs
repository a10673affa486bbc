//! Search-results page enumeration.

use crate::site::client::ListingSource;
use crate::site::{extract, parser};
use crate::throttle::{RetryPolicy, Sleeper};
use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Placeholder in the search URL template that receives the page segment.
pub const PAGE_PLACEHOLDER: &str = "{page}";

/// How many results pages to visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCount {
    Fixed(u32),
    /// Read the count from the first page's pagination control
    Auto,
}

impl Default for PageCount {
    fn default() -> Self {
        PageCount::Fixed(10)
    }
}

impl FromStr for PageCount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(PageCount::Auto);
        }

        match s.parse::<u32>() {
            Ok(n) if n > 0 => Ok(PageCount::Fixed(n)),
            _ => Err(format!("Invalid page count: {}. Use a positive number or 'auto'", s)),
        }
    }
}

impl fmt::Display for PageCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageCount::Fixed(n) => write!(f, "{}", n),
            PageCount::Auto => write!(f, "auto"),
        }
    }
}

impl Serialize for PageCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageCount::Fixed(n) => serializer.serialize_u32(*n),
            PageCount::Auto => serializer.serialize_str("auto"),
        }
    }
}

impl<'de> Deserialize<'de> for PageCount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(i64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(n) if n > 0 && n <= u32::MAX as i64 => Ok(PageCount::Fixed(n as u32)),
            Repr::Number(n) => Err(serde::de::Error::custom(format!("Invalid page count: {}", n))),
            Repr::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Lazy sequence of results-page URLs.
///
/// The first URL is the template with the placeholder removed; page `k >= 2`
/// substitutes `page-k/`.
#[derive(Debug)]
pub struct PageUrls {
    template: String,
    pages: u32,
    next: u32,
}

impl PageUrls {
    pub fn new(template: impl Into<String>, pages: u32) -> Self {
        Self { template: template.into(), pages: pages.max(1), next: 1 }
    }

    /// Number of pages this sequence covers.
    pub fn pages(&self) -> u32 {
        self.pages
    }
}

impl Iterator for PageUrls {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.next > self.pages {
            return None;
        }

        let url = page_url(&self.template, self.next);
        self.next += 1;
        Some(url)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.pages + 1).saturating_sub(self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PageUrls {}

/// URL of results page `page` (1-based).
pub fn page_url(template: &str, page: u32) -> String {
    if page <= 1 {
        template.replace(PAGE_PLACEHOLDER, "")
    } else {
        template.replace(PAGE_PLACEHOLDER, &format!("page-{}/", page))
    }
}

/// Builds the page sequence, fetching the first page when the count is
/// [`PageCount::Auto`].
///
/// Detection goes through the same throttle retry as any results page, so a
/// throttled first response is retried rather than counted as one page.
pub async fn resolve(
    source: &dyn ListingSource,
    template: &str,
    count: PageCount,
    retry: &RetryPolicy,
    sleeper: &dyn Sleeper,
) -> Result<PageUrls> {
    let pages = match count {
        PageCount::Fixed(n) => n,
        PageCount::Auto => {
            let first = page_url(template, 1);
            let (html, _) = extract::fetch_results_page(source, &first, retry, sleeper)
                .await
                .with_context(|| format!("Failed to fetch {} for page detection", first))?;
            let detected = parser::parse_page_count(&html);
            info!("Detected {} results pages", detected);
            detected
        }
    };

    Ok(PageUrls::new(template, pages))
}
