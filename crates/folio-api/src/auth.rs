//! # Authorization Gate
//!
//! Validates the presented credential against the key store and checks
//! payment eligibility. Consulted exactly once per request, after the
//! identifier normalizes and before any catalog or index call, so an
//! unauthorized request never costs an external round trip.
//!
//! ## Credential Sources
//!
//! `api_key` query parameter, else `Authorization: Bearer` header; the
//! query parameter wins when both are present. A request with no
//! credential is rejected without a store lookup.

use axum::http::{header, HeaderMap};
use chrono::Utc;

use crate::error::AppError;
use crate::keystore::KeyStore;

/// Outcome of the gate. Consumed once; never cached across requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// Whether the credential identifies a live key.
    pub valid: bool,
    /// Whether the key carries payment eligibility.
    pub is_paying: bool,
    /// Rejection detail for the 401 message.
    pub detail: Option<String>,
}

impl AuthContext {
    fn invalid(detail: impl Into<String>) -> Self {
        Self {
            valid: false,
            is_paying: false,
            detail: Some(detail.into()),
        }
    }
}

/// Pull the credential from the query parameters or the bearer header.
pub fn credential_from(params: &[(String, String)], headers: &HeaderMap) -> Option<String> {
    let from_query = params
        .iter()
        .find(|(name, _)| name == "api_key")
        .map(|(_, value)| value.clone())
        .filter(|value| !value.is_empty());

    from_query.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_string)
            .filter(|value| !value.is_empty())
    })
}

/// Evaluate a credential against the key store.
///
/// Store faults propagate as `Err` — they must not be conflated with
/// "not found", which is an ordinary invalid outcome.
pub async fn check(
    keys: &dyn KeyStore,
    credential: Option<&str>,
) -> Result<AuthContext, crate::keystore::KeyStoreError> {
    let Some(key) = credential else {
        return Ok(AuthContext::invalid("no API key provided"));
    };

    let Some(record) = keys.fetch(key).await? else {
        return Ok(AuthContext::invalid("not found"));
    };

    if let Some(expires_at) = record.expires_at {
        if expires_at <= Utc::now() {
            return Ok(AuthContext::invalid(format!(
                "expired on {}",
                expires_at.to_rfc3339()
            )));
        }
    }

    Ok(AuthContext {
        valid: true,
        is_paying: record.is_paying,
        detail: None,
    })
}

/// Run the full gate, mapping outcomes to HTTP errors:
/// invalid → 401, valid but not paying → 403, store fault → 500.
pub async fn authorize(keys: &dyn KeyStore, credential: Option<&str>) -> Result<(), AppError> {
    let context = check(keys, credential).await.map_err(|e| {
        tracing::error!(error = %e, "credential store fault");
        AppError::Internal(e.to_string())
    })?;

    if !context.valid {
        return Err(AppError::Unauthorized(
            context.detail.unwrap_or_else(|| "invalid API key".into()),
        ));
    }
    if !context.is_paying {
        return Err(AppError::PaymentIneligible(
            "API key is not payment-eligible".into(),
        ));
    }
    Ok(())
}
