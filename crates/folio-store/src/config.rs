//! Storage configuration.
//!
//! Bucket names, table names, regions, and credentials are injected as
//! explicit configuration structs — nothing is read from module-level
//! constants — so tests can point every client at a mock server.

use url::Url;

/// Access credentials for a signed store.
///
/// Custom `Debug` redacts the secret to prevent credential leakage in
/// log output.
#[derive(Clone)]
pub struct StoreCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for StoreCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .finish()
    }
}

/// Configuration for one object-store tier.
#[derive(Debug, Clone)]
pub struct ObjectStoreConfig {
    /// Short name used in logs (`primary`, `backup`).
    pub name: String,
    pub bucket: String,
    pub region: String,
    /// Explicit endpoint. When absent, the region-default
    /// `https://s3.{region}.amazonaws.com` is used.
    pub endpoint: Option<Url>,
    /// Virtual-hosted-style addressing (`{bucket}.{endpoint_host}`)
    /// instead of path-style (`{endpoint_host}/{bucket}`).
    pub virtual_hosted: bool,
    pub credentials: StoreCredentials,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl ObjectStoreConfig {
    /// Load one tier's configuration from `{prefix}_*` environment
    /// variables.
    ///
    /// Variables (for prefix `FOLIO_PRIMARY`):
    /// - `FOLIO_PRIMARY_BUCKET` (required)
    /// - `FOLIO_PRIMARY_REGION` (default: `us-east-1`)
    /// - `FOLIO_PRIMARY_ENDPOINT` (optional)
    /// - `FOLIO_PRIMARY_VIRTUAL_HOSTED` (default: `false`)
    /// - `FOLIO_PRIMARY_ACCESS_KEY_ID` (required)
    /// - `FOLIO_PRIMARY_SECRET_ACCESS_KEY` (required)
    /// - `FOLIO_PRIMARY_TIMEOUT_SECS` (default: 30)
    pub fn from_env(name: &str, prefix: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            name: name.to_string(),
            bucket: require(&format!("{prefix}_BUCKET"))?,
            region: optional(&format!("{prefix}_REGION")).unwrap_or_else(|| "us-east-1".into()),
            endpoint: optional_url(&format!("{prefix}_ENDPOINT"))?,
            virtual_hosted: optional(&format!("{prefix}_VIRTUAL_HOSTED"))
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
            credentials: StoreCredentials {
                access_key_id: require(&format!("{prefix}_ACCESS_KEY_ID"))?,
                secret_access_key: require(&format!("{prefix}_SECRET_ACCESS_KEY"))?,
            },
            timeout_secs: optional(&format!("{prefix}_TIMEOUT_SECS"))
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        })
    }
}

/// Configuration for the mapping index.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub region: String,
    /// Explicit endpoint. When absent, the region-default
    /// `https://dynamodb.{region}.amazonaws.com` is used.
    pub endpoint: Option<Url>,
    /// Table holding raw-document mappings.
    pub pdf_table: String,
    /// Table holding parsed-text mappings.
    pub text_table: String,
    /// Name of the secondary index keyed by `native_id`.
    pub native_id_index: String,
    pub credentials: StoreCredentials,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl IndexConfig {
    /// Load index configuration from `FOLIO_INDEX_*` environment
    /// variables.
    ///
    /// Variables:
    /// - `FOLIO_INDEX_REGION` (default: `us-east-1`)
    /// - `FOLIO_INDEX_ENDPOINT` (optional)
    /// - `FOLIO_INDEX_PDF_TABLE` (default: `folio-pdf-mappings`)
    /// - `FOLIO_INDEX_TEXT_TABLE` (default: `folio-text-mappings`)
    /// - `FOLIO_INDEX_NATIVE_ID_INDEX` (default: `native_id-index`)
    /// - `FOLIO_INDEX_ACCESS_KEY_ID` (required)
    /// - `FOLIO_INDEX_SECRET_ACCESS_KEY` (required)
    /// - `FOLIO_INDEX_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            region: optional("FOLIO_INDEX_REGION").unwrap_or_else(|| "us-east-1".into()),
            endpoint: optional_url("FOLIO_INDEX_ENDPOINT")?,
            pdf_table: optional("FOLIO_INDEX_PDF_TABLE")
                .unwrap_or_else(|| "folio-pdf-mappings".into()),
            text_table: optional("FOLIO_INDEX_TEXT_TABLE")
                .unwrap_or_else(|| "folio-text-mappings".into()),
            native_id_index: optional("FOLIO_INDEX_NATIVE_ID_INDEX")
                .unwrap_or_else(|| "native_id-index".into()),
            credentials: StoreCredentials {
                access_key_id: require("FOLIO_INDEX_ACCESS_KEY_ID")?,
                secret_access_key: require("FOLIO_INDEX_SECRET_ACCESS_KEY")?,
            },
            timeout_secs: optional("FOLIO_INDEX_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        })
    }
}

fn require(var: &str) -> Result<String, ConfigError> {
    std::env::var(var).map_err(|_| ConfigError::MissingVar(var.to_string()))
}

fn optional(var: &str) -> Option<String> {
    std::env::var(var).ok()
}

fn optional_url(var: &str) -> Result<Option<Url>, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => Url::parse(&raw)
            .map(Some)
            .map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string())),
        Err(_) => Ok(None),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    MissingVar(String),
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}
