//! Catalog client error types.

/// Errors from works-catalog calls.
///
/// A clean "no open-access location" answer is **not** an error — the
/// client returns `Ok(None)` for that. These variants cover transport
/// failures, non-2xx responses, and response-shape violations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Catalog returned a non-2xx status other than 404.
    #[error("catalog {endpoint} returned {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}
