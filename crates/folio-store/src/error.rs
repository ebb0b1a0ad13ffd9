//! Storage error types.
//!
//! [`IndexError`] carries enough context (table, native id) to diagnose
//! a mapping-index fault from the log line alone. [`StoreError`] covers
//! the object tiers; tier callers fold it into "absent" rather than
//! propagating it (see [`crate::tiered`]).

/// Errors from the mapping index.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// HTTP transport error.
    #[error("HTTP error querying {table} for {native_id:?}: {source}")]
    Http {
        table: String,
        native_id: String,
        source: reqwest::Error,
    },
    /// The index store answered with a non-2xx status.
    #[error("index {table} returned {status} for {native_id:?}: {body}")]
    Api {
        table: String,
        native_id: String,
        status: u16,
        body: String,
    },
    /// The index answered, but the item is unusable (missing or invalid
    /// `file_uuid`). Distinct from absence — the datum exists and is
    /// wrong, which operators must see.
    #[error("index {table} item for {native_id:?} is malformed: {detail}")]
    Malformed {
        table: String,
        native_id: String,
        detail: String,
    },
    /// The request could not be constructed.
    #[error("failed to build index request: {detail}")]
    InvalidRequest { detail: String },
}

/// Errors from an object-store tier.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// HTTP transport error.
    #[error("HTTP error calling {store} store for key {key:?}: {source}")]
    Http {
        store: String,
        key: String,
        source: reqwest::Error,
    },
    /// The request could not be constructed.
    #[error("failed to build {store} store request: {detail}")]
    InvalidRequest { store: String, detail: String },
}
