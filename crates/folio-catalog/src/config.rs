//! Catalog client configuration.
//!
//! Defaults point at the production catalog. Override via environment
//! variables or explicit construction for staging and tests.

use url::Url;

/// Configuration for connecting to the works catalog.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL of the works catalog.
    /// Default: <https://api.openalex.org>
    pub base_url: Url,
    /// Contact address forwarded as the `mailto` query parameter, which
    /// routes requests into the catalog's polite pool.
    pub mailto: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Time-to-live for cached location answers, in seconds.
    pub cache_ttl_secs: u64,
    /// Maximum number of cached location answers.
    pub cache_capacity: usize,
}

impl CatalogConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `FOLIO_CATALOG_URL` (default: `https://api.openalex.org`)
    /// - `FOLIO_CATALOG_MAILTO` (optional)
    /// - `FOLIO_CATALOG_TIMEOUT_SECS` (default: 30)
    /// - `FOLIO_CATALOG_CACHE_TTL_SECS` (default: 300)
    /// - `FOLIO_CATALOG_CACHE_CAPACITY` (default: 10000)
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: env_url("FOLIO_CATALOG_URL", "https://api.openalex.org")?,
            mailto: std::env::var("FOLIO_CATALOG_MAILTO").ok(),
            timeout_secs: env_parse("FOLIO_CATALOG_TIMEOUT_SECS", 30),
            cache_ttl_secs: env_parse("FOLIO_CATALOG_CACHE_TTL_SECS", 300),
            cache_capacity: env_parse("FOLIO_CATALOG_CACHE_CAPACITY", 10_000),
        })
    }

    /// Configuration pointing at a local mock server (for tests).
    pub fn local_mock(base: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: Url::parse(base)
                .map_err(|e| ConfigError::InvalidUrl("local mock".to_string(), e.to_string()))?,
            mailto: None,
            timeout_secs: 5,
            cache_ttl_secs: 300,
            cache_capacity: 64,
        })
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("https://api.openalex.org").expect("static URL parses"),
            mailto: None,
            timeout_secs: 30,
            cache_ttl_secs: 300,
            cache_capacity: 10_000,
        }
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}
