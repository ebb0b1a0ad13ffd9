//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor. Holds only external-collaborator clients
//! — the catalog, the mapping index, the two object tiers, and the
//! credential store — plus configuration. Nothing here survives a
//! request: every resolved value is recomputed per call.

use std::sync::Arc;

use sqlx::PgPool;
use url::Url;

use folio_catalog::CatalogClient;
use folio_store::{MappingIndex, TieredStore};

use crate::keystore::KeyStore;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Public base URL used when deriving self-referential download
    /// URLs in metadata responses.
    pub public_base_url: Url,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            public_base_url: Url::parse("http://localhost:8080").expect("static URL parses"),
        }
    }
}

impl AppConfig {
    /// Build configuration from environment variables.
    ///
    /// Variables:
    /// - `FOLIO_PORT` (default: 8080)
    /// - `FOLIO_PUBLIC_URL` (default: `http://localhost:{port}`)
    pub fn from_env() -> Self {
        let port: u16 = std::env::var("FOLIO_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let public_base_url = std::env::var("FOLIO_PUBLIC_URL")
            .ok()
            .and_then(|raw| Url::parse(&raw).ok())
            .unwrap_or_else(|| {
                Url::parse(&format!("http://localhost:{port}")).expect("static URL parses")
            });

        Self {
            port,
            public_base_url,
        }
    }
}

/// Shared application state accessible to all route handlers.
///
/// Clone-friendly: every field is either `Arc`-shared or internally
/// reference-counted.
#[derive(Clone)]
pub struct AppState {
    /// Works-catalog client (with its TTL answer cache).
    pub catalog: CatalogClient,
    /// Secondary mapping index: native id → artifact UUID.
    pub index: Arc<dyn MappingIndex>,
    /// The two artifact tiers behind one retrieval front.
    pub tiers: TieredStore,
    /// Credential store.
    pub keys: Arc<dyn KeyStore>,
    /// PostgreSQL pool, present when the credential store is
    /// Postgres-backed. Used by the readiness probe.
    pub db_pool: Option<PgPool>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(
        catalog: CatalogClient,
        index: Arc<dyn MappingIndex>,
        tiers: TieredStore,
        keys: Arc<dyn KeyStore>,
        db_pool: Option<PgPool>,
        config: AppConfig,
    ) -> Self {
        Self {
            catalog,
            index,
            tiers,
            keys,
            db_pool,
            config,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("catalog", &self.catalog)
            .field("tiers", &self.tiers)
            .field("db_pool", &self.db_pool.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_binds_8080() {
        let config = AppConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.public_base_url.as_str(), "http://localhost:8080/");
    }
}
