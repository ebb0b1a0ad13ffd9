//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps pipeline errors from folio-core, folio-catalog, and folio-store
//! to HTTP status codes with JSON error bodies. Server-fault details
//! (index tables, upstream bodies, signing material) are logged, never
//! returned to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-checkable error code (e.g. "INVALID_IDENTIFIER").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`].
///
/// Every pipeline stage either returns a typed outcome or short-circuits
/// with one of these; nothing is swallowed silently except the
/// tier-absence folding inside `folio-store`.
#[derive(Error, Debug)]
pub enum AppError {
    /// The raw path segment matches no accepted identifier shape (400).
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Missing, unknown, or expired credential (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Valid credential without payment eligibility (403).
    #[error("forbidden: {0}")]
    PaymentIneligible(String),

    /// Unknown path shape — wrong segment count or kind token (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The catalog has no open-access location for the work (404).
    #[error("no open-access location: {0}")]
    NoOaLocation(String),

    /// No archived artifact — unmapped identifier or both tiers missed (404).
    #[error("artifact absent: {0}")]
    ArtifactAbsent(String),

    /// Mapping-index fault (500). Detail is logged, not returned.
    #[error("index store fault: {0}")]
    IndexFault(String),

    /// Internal fault, e.g. credential store failure (500). Detail is
    /// logged, not returned.
    #[error("internal error: {0}")]
    Internal(String),

    /// The catalog answered with a structurally wrong location
    /// reference (502).
    #[error("malformed upstream reference: {0}")]
    MalformedLocation(String),

    /// Catalog transport failure or unexpected upstream status (502).
    /// Detail is logged, not returned.
    #[error("upstream catalog error: {0}")]
    Upstream(String),
}

impl AppError {
    /// The HTTP status and machine-checkable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::InvalidIdentifier(_) => (StatusCode::BAD_REQUEST, "INVALID_IDENTIFIER"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::PaymentIneligible(_) => (StatusCode::FORBIDDEN, "PAYMENT_INELIGIBLE"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::NoOaLocation(_) => (StatusCode::NOT_FOUND, "NO_OA_LOCATION"),
            Self::ArtifactAbsent(_) => (StatusCode::NOT_FOUND, "ARTIFACT_ABSENT"),
            Self::IndexFault(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INDEX_FAULT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::MalformedLocation(_) => (StatusCode::BAD_GATEWAY, "MALFORMED_LOCATION"),
            Self::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
        }
    }

    /// The message sent to the client. 500-class details and upstream
    /// bodies never leave the server.
    fn client_message(&self) -> String {
        match self {
            Self::IndexFault(_) => "The mapping index is currently unavailable".to_string(),
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::Upstream(_) => "An upstream catalog error occurred".to_string(),
            other => other.to_string(),
        }
    }

    /// Log server-side faults with their full detail.
    fn log(&self) {
        match self {
            Self::IndexFault(_) => tracing::error!(error = %self, "index store fault"),
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::Upstream(_) => tracing::error!(error = %self, "upstream catalog error"),
            Self::MalformedLocation(_) => {
                tracing::warn!(error = %self, "malformed upstream reference")
            }
            _ => {}
        }
    }

    /// Plain-text rendering for stream-mode responses: the JSON error
    /// object degrades to its message field alone.
    pub fn into_plain_response(self) -> Response {
        self.log();
        let (status, _) = self.status_and_code();
        (status, self.client_message()).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let (status, code) = self.status_and_code();
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.client_message(),
            },
        };
        (status, Json(body)).into_response()
    }
}

/// Identifier rejections map to 400.
impl From<folio_core::IdentError> for AppError {
    fn from(err: folio_core::IdentError) -> Self {
        Self::InvalidIdentifier(err.to_string())
    }
}

/// Structurally wrong composite references map to 502.
impl From<folio_core::LocationError> for AppError {
    fn from(err: folio_core::LocationError) -> Self {
        Self::MalformedLocation(err.to_string())
    }
}

/// Catalog faults map to 502. A clean "no location" answer is not an
/// error and never reaches this conversion.
impl From<folio_catalog::CatalogError> for AppError {
    fn from(err: folio_catalog::CatalogError) -> Self {
        Self::Upstream(err.to_string())
    }
}

/// Index faults map to 500 with the diagnostic context preserved for
/// the log line.
impl From<folio_store::IndexError> for AppError {
    fn from(err: folio_store::IndexError) -> Self {
        Self::IndexFault(err.to_string())
    }
}
