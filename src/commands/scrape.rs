//! Scrape command: pages → listings → filters → map.

use crate::config::{Config, Secrets};
use crate::error::ScrapeError;
use crate::filters::{ExclusionSet, FilterChain, Rejection};
use crate::geocode::{Geocoder, GoogleGeocoder};
use crate::pagination;
use crate::render;
use crate::site::{self, KijijiClient, Listing, ListingDetails, ListingSource, ListingSummary};
use crate::throttle::{FixedDelay, Pacer, Sleeper, TokioSleeper};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of a scrape run.
#[derive(Debug, Default)]
pub struct ScrapeReport {
    /// Listings that passed every filter, in page order
    pub accepted: Vec<Listing>,
    /// Rejected listing links and why
    pub rejected: Vec<(String, Rejection)>,
    /// Results pages abandoned after exhausting the throttle retry policy
    pub throttled_pages: Vec<String>,
}

impl ScrapeReport {
    /// Rejections that were purely about price.
    pub fn out_of_range(&self) -> impl Iterator<Item = &(String, Rejection)> {
        self.rejected.iter().filter(|(_, r)| matches!(r, Rejection::OverCeiling { .. }))
    }
}

/// Runs the whole pipeline once.
pub struct ScrapeCommand {
    config: Config,
}

impl ScrapeCommand {
    /// Creates a new scrape command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Scrapes with the production client and geocoder, then writes the output
    /// file. Returns the report for the caller to summarize.
    pub async fn execute(&self, secrets: &Secrets, exclusions: ExclusionSet) -> Result<ScrapeReport> {
        let client = KijijiClient::new().context("Failed to create HTTP client")?;
        let geocoder = GoogleGeocoder::new(secrets.geocoding_api_key.clone())
            .context("Failed to create geocoder")?;
        let sleeper: Arc<dyn Sleeper> = Arc::new(TokioSleeper);
        let pacer =
            FixedDelay::new(self.config.delay_ms, self.config.delay_jitter_ms, sleeper.clone());

        let report =
            self.execute_with(&client, &geocoder, &pacer, sleeper.as_ref(), exclusions).await?;

        let output = render::render(
            self.config.format,
            &report.accepted,
            self.config.map_center,
            &secrets.maps_js_api_key,
        )?;
        render::write_output(&self.config.output, &output)?;

        Ok(report)
    }

    /// Runs the pipeline with provided collaborators (for testing).
    pub async fn execute_with(
        &self,
        source: &dyn ListingSource,
        geocoder: &dyn Geocoder,
        pacer: &dyn Pacer,
        sleeper: &dyn Sleeper,
        exclusions: ExclusionSet,
    ) -> Result<ScrapeReport> {
        self.config.validate()?;

        let filters = FilterChain::standard(exclusions, self.config.price_ceiling);
        debug!("Active filters: {}", filters.descriptions().join(", "));

        let retry = self.config.retry_policy();
        let pages = pagination::resolve(
            source,
            &self.config.search_url,
            self.config.pages,
            &retry,
            sleeper,
        )
        .await?;

        let mut report = ScrapeReport::default();

        for url in pages {
            info!("Processing {}", url);

            let summaries = match site::fetch_summaries(source, &url, &retry, sleeper).await {
                Ok(summaries) => summaries,
                Err(e) => match e.downcast_ref::<ScrapeError>() {
                    Some(ScrapeError::Throttled { .. }) => {
                        warn!("Skipping page: {}", e);
                        report.throttled_pages.push(url);
                        continue;
                    }
                    None => return Err(e.context(format!("Failed to fetch results page {}", url))),
                },
            };

            for summary in summaries {
                let listing = enrich(source, geocoder, pacer, summary).await;

                match filters.check(&listing) {
                    Ok(()) => {
                        debug!("Accepted: {}", listing.title);
                        report.accepted.push(listing);
                    }
                    Err(rejection) => {
                        match &rejection {
                            Rejection::OverCeiling { .. } => {
                                info!("{}: {}", rejection, listing.link)
                            }
                            _ => debug!("Rejected ({}): {}", rejection, listing.link),
                        }
                        report.rejected.push((listing.link, rejection));
                    }
                }
            }
        }

        info!(
            "Accepted {} listings, rejected {}, skipped {} throttled pages",
            report.accepted.len(),
            report.rejected.len(),
            report.throttled_pages.len()
        );

        Ok(report)
    }
}

/// Fetches a listing's details and geocodes its address. A listing page that
/// cannot be fetched yields a listing with no details rather than an error.
async fn enrich(
    source: &dyn ListingSource,
    geocoder: &dyn Geocoder,
    pacer: &dyn Pacer,
    summary: ListingSummary,
) -> Listing {
    info!("{}", summary.title);

    let details = match site::fetch_details(source, &summary.link, pacer).await {
        Ok(details) => details,
        Err(e) => {
            warn!("Could not fetch listing {}: {:#}", summary.link, e);
            ListingDetails::default()
        }
    };

    let coordinates = match details.address.as_deref() {
        Some(address) => geocoder.geocode(address).await,
        None => None,
    };

    Listing::assemble(summary, details, coordinates)
}
