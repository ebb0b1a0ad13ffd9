//! Credential persistence operations.
//!
//! Reads the `api_keys` table and increments the `api_key_usage` daily
//! counters. Rows are provisioned by the account tooling — Folio never
//! writes key records.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use crate::keystore::{ApiKeyRecord, KeyStore, KeyStoreError};

/// Postgres-backed [`KeyStore`].
#[derive(Debug, Clone)]
pub struct PgKeyStore {
    pool: PgPool,
}

impl PgKeyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ApiKeyRow {
    key: String,
    expires_at: Option<DateTime<Utc>>,
    is_paying: bool,
    requests_per_day: Option<i64>,
    organization: Option<String>,
    email: Option<String>,
}

impl ApiKeyRow {
    fn into_record(self) -> ApiKeyRecord {
        ApiKeyRecord {
            key: self.key,
            expires_at: self.expires_at,
            is_paying: self.is_paying,
            requests_per_day: self.requests_per_day,
            organization: self.organization,
            email: self.email,
        }
    }
}

#[async_trait]
impl KeyStore for PgKeyStore {
    async fn fetch(&self, key: &str) -> Result<Option<ApiKeyRecord>, KeyStoreError> {
        let row = sqlx::query_as::<_, ApiKeyRow>(
            "SELECT key, expires_at, is_paying, requests_per_day, organization, email
             FROM api_keys WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| KeyStoreError::Backend(e.to_string()))?;

        Ok(row.map(ApiKeyRow::into_record))
    }

    async fn record_usage(&self, key: &str, day: NaiveDate) -> Result<(), KeyStoreError> {
        sqlx::query(
            "INSERT INTO api_key_usage (key, day, requests) VALUES ($1, $2, 1)
             ON CONFLICT (key, day) DO UPDATE SET requests = api_key_usage.requests + 1",
        )
        .bind(key)
        .bind(day)
        .execute(&self.pool)
        .await
        .map_err(|e| KeyStoreError::Backend(e.to_string()))?;

        Ok(())
    }
}
