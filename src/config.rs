//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::pagination::PageCount;
use crate::site::Coordinates;
use crate::throttle::RetryPolicy;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const DEFAULT_SEARCH_URL: &str = "https://www.kijiji.ca/b-apartments-condos/ottawa/{page}c37l1700185?ll=45.421530%2C-75.697193&address=Ottawa%2C+ON&ad=offering&radius=110.0&price=__700185";

/// Run configuration, built once at startup and passed to every component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Search URL template with a `{page}` placeholder
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// Number of results pages, or "auto"
    #[serde(default)]
    pub pages: PageCount,

    /// Listings above this monthly price are dropped
    #[serde(default = "default_price_ceiling")]
    pub price_ceiling: f64,

    /// Output file
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Initial map center
    #[serde(default = "default_map_center")]
    pub map_center: Coordinates,

    /// JSON array of listing links to skip
    #[serde(default = "default_exclusions")]
    pub exclusions: PathBuf,

    /// Credentials file
    #[serde(default = "default_secrets")]
    pub secrets: PathBuf,

    /// Delay before every listing-detail fetch, in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Random jitter added to the delay (0 to this value)
    #[serde(default)]
    pub delay_jitter_ms: u64,

    /// Sleep after an empty results page before refetching it
    #[serde(default = "default_throttle_backoff_secs")]
    pub throttle_backoff_secs: u64,

    /// Growth factor for consecutive throttle sleeps
    #[serde(default = "default_throttle_backoff_multiplier")]
    pub throttle_backoff_multiplier: f64,

    /// Give up on a page after this many fetches; unset retries forever
    #[serde(default)]
    pub throttle_max_attempts: Option<u32>,
}

fn default_search_url() -> String {
    DEFAULT_SEARCH_URL.to_string()
}

fn default_price_ceiling() -> f64 {
    900.0
}

fn default_output() -> PathBuf {
    PathBuf::from("map.html")
}

fn default_map_center() -> Coordinates {
    Coordinates::new(45.4214, -75.6919)
}

fn default_exclusions() -> PathBuf {
    PathBuf::from("exclusions.json")
}

fn default_secrets() -> PathBuf {
    PathBuf::from("secrets.toml")
}

fn default_delay_ms() -> u64 {
    3000
}

fn default_throttle_backoff_secs() -> u64 {
    120
}

fn default_throttle_backoff_multiplier() -> f64 {
    1.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_url: default_search_url(),
            pages: PageCount::default(),
            price_ceiling: default_price_ceiling(),
            output: default_output(),
            format: OutputFormat::Html,
            map_center: default_map_center(),
            exclusions: default_exclusions(),
            secrets: default_secrets(),
            delay_ms: default_delay_ms(),
            delay_jitter_ms: 0,
            throttle_backoff_secs: default_throttle_backoff_secs(),
            throttle_backoff_multiplier: default_throttle_backoff_multiplier(),
            throttle_max_attempts: None,
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        let local_config = Path::new("kijiji-map.toml");
        if local_config.exists() {
            debug!("Found kijiji-map.toml in current directory");
            return Self::from_file(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("kijiji-map").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides. Unparseable values are ignored.
    pub fn with_env(mut self) -> Self {
        if let Ok(url) = std::env::var("KMAP_SEARCH_URL") {
            if !url.trim().is_empty() {
                self.search_url = url;
            }
        }

        if let Ok(ceiling) = std::env::var("KMAP_PRICE_CEILING") {
            if let Some(c) = ceiling.parse().ok().filter(|c| is_valid_ceiling(*c)) {
                self.price_ceiling = c;
            }
        }

        if let Ok(output) = std::env::var("KMAP_OUTPUT") {
            if !output.trim().is_empty() {
                self.output = PathBuf::from(output);
            }
        }

        if let Ok(delay) = std::env::var("KMAP_DELAY") {
            if let Ok(d) = delay.parse() {
                self.delay_ms = d;
            }
        }

        self
    }

    /// Throttle-retry policy for empty results pages.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.throttle_max_attempts,
            backoff: Duration::from_secs(self.throttle_backoff_secs),
            multiplier: self.throttle_backoff_multiplier,
        }
    }

    /// Checks the fully layered configuration before a run.
    pub fn validate(&self) -> Result<()> {
        if !is_valid_ceiling(self.price_ceiling) {
            bail!(
                "Invalid price ceiling: {} (expected a non-negative number)",
                self.price_ceiling
            );
        }

        Ok(())
    }
}

/// A usable price ceiling is a finite, non-negative amount.
pub fn is_valid_ceiling(ceiling: f64) -> bool {
    ceiling.is_finite() && ceiling >= 0.0
}

/// API credentials, kept out of the main config file.
#[derive(Clone, Deserialize)]
pub struct Secrets {
    /// Server-side key for the geocoding API
    pub geocoding_api_key: String,
    /// Browser key for the map widget
    pub maps_js_api_key: String,
}

impl Secrets {
    /// Loads credentials from a TOML file. A missing file is an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading secrets from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read secrets file: {}", path.display()))?;

        let secrets: Secrets = toml::from_str(&content)
            .with_context(|| format!("Failed to parse secrets file: {}", path.display()))?;

        if secrets.geocoding_api_key.trim().is_empty() {
            anyhow::bail!("geocoding_api_key is empty in {}", path.display());
        }

        Ok(secrets)
    }
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("geocoding_api_key", &"<redacted>")
            .field("maps_js_api_key", &"<redacted>")
            .finish()
    }
}

/// Output format for the accepted listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Map page
    #[default]
    Html,
    /// Raw listing array
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "html" | "map" => Ok(OutputFormat::Html),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use: html, json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Html => write!(f, "html"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
