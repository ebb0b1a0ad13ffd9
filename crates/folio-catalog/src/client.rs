//! Typed client for the works catalog.
//!
//! One read-only operation: resolve a canonical work id to the composite
//! reference (`scheme:native_id`) of its best open-access location.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::cache::LocationCache;
use crate::config::CatalogConfig;
use crate::error::CatalogError;

/// Narrow structural view of a catalog work record.
///
/// Only the two fields Folio consumes are modeled; the live catalog
/// returns many more, which are ignored. `deny_unknown_fields` is
/// intentionally NOT used — the catalog schema evolves independently.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogWork {
    /// Catalog identifier of the work (echoed back, used only for logs).
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub best_oa_location: Option<BestOaLocation>,
}

/// The best open-access location block of a work record.
#[derive(Debug, Clone, Deserialize)]
pub struct BestOaLocation {
    /// Composite `scheme:native_id` reference of the location.
    #[serde(default)]
    pub id: Option<String>,
}

/// Client for the works catalog.
#[derive(Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: Url,
    mailto: Option<String>,
    cache: LocationCache,
}

impl CatalogClient {
    /// Create a new catalog client from configuration.
    pub fn new(config: CatalogConfig) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CatalogError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            http,
            base_url: config.base_url,
            mailto: config.mailto,
            cache: LocationCache::new(
                config.cache_capacity,
                Duration::from_secs(config.cache_ttl_secs),
            ),
        })
    }

    /// Resolve a canonical work id to its best open-access location
    /// reference.
    ///
    /// Calls `GET {base}/works/{id}?select=id,best_oa_location`.
    ///
    /// Returns `Ok(None)` when the catalog has no such work (404) or the
    /// work has no `best_oa_location` — a clean negative answer, cached
    /// like a positive one. Transport failures and other non-2xx
    /// statuses are [`CatalogError`]s and are never cached.
    pub async fn best_oa_location(&self, work_id: &str) -> Result<Option<String>, CatalogError> {
        if let Some(answer) = self.cache.get(work_id) {
            tracing::debug!(work_id, "catalog answer served from cache");
            return Ok(answer);
        }

        let endpoint = format!("GET /works/{work_id}");
        let url = format!("{}works/{work_id}", self.base_url);

        let mut request = self
            .http
            .get(&url)
            .query(&[("select", "id,best_oa_location")]);
        if let Some(mailto) = &self.mailto {
            request = request.query(&[("mailto", mailto.as_str())]);
        }

        let resp = request.send().await.map_err(|e| CatalogError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            self.cache.put(work_id, None);
            return Ok(None);
        }

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(CatalogError::Api {
                endpoint,
                status,
                body,
            });
        }

        let work: CatalogWork = resp.json().await.map_err(|e| CatalogError::Deserialization {
            endpoint,
            source: e,
        })?;

        let location = work
            .best_oa_location
            .and_then(|loc| loc.id)
            .filter(|id| !id.is_empty());

        self.cache.put(work_id, location.clone());
        Ok(location)
    }

    /// Access the underlying answer cache (exposed for tests and the
    /// readiness probe).
    pub fn cache(&self) -> &LocationCache {
        &self.cache
    }
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("base_url", &self.base_url.as_str())
            .field("mailto", &self.mailto)
            .finish_non_exhaustive()
    }
}
