//! Pages command: list the results-page URLs a scrape would visit.

use crate::config::Config;
use crate::pagination;
use crate::site::{KijijiClient, ListingSource};
use crate::throttle::{Sleeper, TokioSleeper};
use anyhow::{Context, Result};

pub struct PagesCommand {
    config: Config,
}

impl PagesCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Returns one URL per line.
    pub async fn execute(&self) -> Result<String> {
        let client = KijijiClient::new().context("Failed to create HTTP client")?;
        self.execute_with(&client, &TokioSleeper).await
    }

    /// Lists pages with provided collaborators (for testing). The source is
    /// only used when the page count is auto-detected.
    pub async fn execute_with(
        &self,
        source: &dyn ListingSource,
        sleeper: &dyn Sleeper,
    ) -> Result<String> {
        let urls = pagination::resolve(
            source,
            &self.config.search_url,
            self.config.pages,
            &self.config.retry_policy(),
            sleeper,
        )
        .await?;
        Ok(urls.collect::<Vec<_>>().join("\n"))
    }
}
