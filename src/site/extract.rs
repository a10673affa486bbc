//! Page-level extraction: fetch a page through a [`ListingSource`] and parse it.

use crate::error::ScrapeError;
use crate::site::client::ListingSource;
use crate::site::models::{ListingDetails, ListingSummary};
use crate::site::parser;
use crate::throttle::{Pacer, RetryPolicy, Sleeper};
use anyhow::Result;
use tracing::{info, warn};

/// Fetches a results page and returns its listing cards.
///
/// A page with zero cards is taken as a throttling response: the same URL is
/// refetched after sleeping per `retry` until cards appear. When the policy
/// runs out of attempts this returns [`ScrapeError::Throttled`].
pub async fn fetch_summaries(
    source: &dyn ListingSource,
    url: &str,
    retry: &RetryPolicy,
    sleeper: &dyn Sleeper,
) -> Result<Vec<ListingSummary>> {
    let (_, summaries) = fetch_results_page(source, url, retry, sleeper).await?;
    Ok(summaries)
}

/// Same retry loop as [`fetch_summaries`], also handing back the raw HTML of
/// the first non-throttled response.
pub async fn fetch_results_page(
    source: &dyn ListingSource,
    url: &str,
    retry: &RetryPolicy,
    sleeper: &dyn Sleeper,
) -> Result<(String, Vec<ListingSummary>)> {
    let mut attempt = 1;

    loop {
        let html = source.fetch(url).await?;
        let summaries = parser::parse_summaries(&html, url);

        if !summaries.is_empty() {
            return Ok((html, summaries));
        }

        if !retry.allows(attempt + 1) {
            return Err(ScrapeError::Throttled { url: url.to_string(), attempts: attempt }.into());
        }

        let delay = retry.delay_for(attempt);
        warn!("Throttled by Kijiji, sleeping {}s before retrying {}", delay.as_secs(), url);
        sleeper.sleep(delay).await;
        attempt += 1;
    }
}

/// Fetches a listing page after waiting on `pacer`, and extracts its details.
pub async fn fetch_details(
    source: &dyn ListingSource,
    url: &str,
    pacer: &dyn Pacer,
) -> Result<ListingDetails> {
    pacer.pace().await;

    info!("Fetching listing: {}", url);
    let html = source.fetch(url).await?;

    Ok(parser::parse_details(&html))
}
