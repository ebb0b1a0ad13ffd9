//! # Credential Store Seam
//!
//! The API-key table is collaborator-owned: Folio reads key records and
//! increments daily usage counters, nothing more. [`KeyStore`] is the
//! seam; the Postgres implementation lives in [`crate::db::keys`], the
//! in-memory one below backs tests and dev mode.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;

/// One provisioned API key.
#[derive(Debug, Clone)]
pub struct ApiKeyRecord {
    /// The opaque key string clients present.
    pub key: String,
    /// Expiry instant; `None` = never expires.
    pub expires_at: Option<DateTime<Utc>>,
    /// Payment eligibility — gates artifact access entirely.
    pub is_paying: bool,
    /// Daily request quota. Stored for the account tooling; Folio
    /// counts usage but does not enforce the quota.
    pub requests_per_day: Option<i64>,
    /// Subscribing organization, when known.
    pub organization: Option<String>,
    /// Contact address, when known.
    pub email: Option<String>,
}

/// Credential store failures. A missing record is `Ok(None)` on
/// [`KeyStore::fetch`], never an error — backends must keep "not found"
/// and "backend down" distinguishable.
#[derive(Debug, thiserror::Error)]
pub enum KeyStoreError {
    #[error("key store backend error: {0}")]
    Backend(String),
}

/// Read/count access to the credential store.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Fetch a key record. `Ok(None)` = no such key.
    async fn fetch(&self, key: &str) -> Result<Option<ApiKeyRecord>, KeyStoreError>;

    /// Increment the `(key, day)` usage counter.
    async fn record_usage(&self, key: &str, day: NaiveDate) -> Result<(), KeyStoreError>;
}

/// In-memory credential store for tests and dev mode.
#[derive(Clone, Default)]
pub struct MemoryKeyStore {
    records: Arc<RwLock<HashMap<String, ApiKeyRecord>>>,
    usage: Arc<RwLock<HashMap<(String, NaiveDate), i64>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision a key record.
    pub fn insert(&self, record: ApiKeyRecord) {
        self.records.write().insert(record.key.clone(), record);
    }

    /// Usage counted for `(key, day)`.
    pub fn usage_for(&self, key: &str, day: NaiveDate) -> i64 {
        self.usage
            .read()
            .get(&(key.to_string(), day))
            .copied()
            .unwrap_or(0)
    }

    /// Toggle fault injection: every call fails with a backend error.
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_fault(&self) -> Result<(), KeyStoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(KeyStoreError::Backend("injected key store fault".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    async fn fetch(&self, key: &str) -> Result<Option<ApiKeyRecord>, KeyStoreError> {
        self.check_fault()?;
        Ok(self.records.read().get(key).cloned())
    }

    async fn record_usage(&self, key: &str, day: NaiveDate) -> Result<(), KeyStoreError> {
        self.check_fault()?;
        *self
            .usage
            .write()
            .entry((key.to_string(), day))
            .or_insert(0) += 1;
        Ok(())
    }
}

impl std::fmt::Debug for MemoryKeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryKeyStore")
            .field("records", &self.records.read().len())
            .finish()
    }
}
