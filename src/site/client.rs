//! HTTP client for Kijiji pages using wreq for browser emulation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};
use wreq::Client;
use wreq_util::Emulation;

/// Anything that can return the HTML of a page - enables mocking for tests.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetches `url` and returns the response body.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Kijiji HTTP client impersonating a desktop Chrome browser.
pub struct KijijiClient {
    client: Client,
}

impl KijijiClient {
    /// Creates a new client with browser-like defaults.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ListingSource for KijijiClient {
    async fn fetch(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .emulation(Emulation::Chrome131)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8")
            .header("Accept-Language", "en-CA,en;q=0.9,fr-CA;q=0.8")
            .header("Cache-Control", "no-cache")
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", "none")
            .header("Upgrade-Insecure-Requests", "1")
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        let status = response.status();
        debug!("Response status: {}", status);

        if status == 429 {
            warn!("Kijiji answered 429 Too Many Requests for {}", url);
        }

        if !status.is_success() {
            anyhow::bail!("Request to {} failed with status: {}", url, status);
        }

        response.text().await.context("Failed to read response body")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_success() {
        let mock_server = MockServer::start().await;

        let html = r#"<html><body><div class="regular-ad"><a class="title" href="/v/1">Loft</a></div></body></html>"#;

        Mock::given(method("GET"))
            .and(path("/b-apartments-condos/ottawa/c37l1700185"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&mock_server)
            .await;

        let client = KijijiClient::new().unwrap();
        let url = format!("{}/b-apartments-condos/ottawa/c37l1700185", mock_server.uri());
        let body = client.fetch(&url).await.unwrap();
        assert!(body.contains("Loft"));
    }

    #[tokio::test]
    async fn test_fetch_http_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = KijijiClient::new().unwrap();
        let result = client.fetch(&format!("{}/v/missing", mock_server.uri())).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_fetch_too_many_requests() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&mock_server)
            .await;

        let client = KijijiClient::new().unwrap();
        let result = client.fetch(&mock_server.uri()).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("429"));
    }

    #[tokio::test]
    async fn test_fetch_empty_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(""))
            .mount(&mock_server)
            .await;

        let client = KijijiClient::new().unwrap();
        let body = client.fetch(&mock_server.uri()).await.unwrap();
        assert!(body.is_empty());
    }
}
