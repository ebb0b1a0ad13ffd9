//! # folio-api — Axum HTTP Service for Folio
//!
//! Resolves a bibliographic work identifier to a harvested artifact and
//! serves it, falling back transparently between the hot primary store
//! and the cold backup.
//!
//! ## API Surface
//!
//! | Route                               | Module             | Notes                  |
//! |-------------------------------------|--------------------|------------------------|
//! | `GET /v1/works/{id...}/{kind}`      | [`routes::works`]  | The resolution pipeline |
//! | `GET /health/liveness`              | here               | Unauthenticated        |
//! | `GET /health/readiness`             | here               | Pings Postgres when configured |
//! | `GET /openapi.json`                 | [`openapi`]        | Generated via utoipa   |
//!
//! ## Pipeline
//!
//! ```text
//! path shape → normalize → authorize → catalog → location parse
//!            → index lookup → tier probe/fetch → assemble
//! ```
//!
//! Every stage returns a typed outcome or short-circuits with an
//! [`AppError`]; all errors map to structured HTTP responses.

pub mod auth;
pub mod db;
pub mod error;
pub mod keystore;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

pub use error::AppError;
pub use state::{AppConfig, AppState};

/// Assemble the full application router.
///
/// Health probes and the OpenAPI document are unauthenticated; the
/// works route carries its own credential gate (the gate needs the
/// normalized identifier, so it runs inside the pipeline rather than
/// as a middleware layer).
pub fn app(state: AppState) -> Router {
    let api = routes::works::router()
        .merge(openapi::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .with_state(state);

    Router::new()
        .merge(health)
        .merge(api)
        .fallback(unknown_route)
}

/// Liveness probe — always 200 while the process runs.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — verifies the credential store is reachable when a
/// database is configured.
async fn readiness(State(state): State<AppState>) -> Response {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!("Database health check failed: {e}");
            return (StatusCode::SERVICE_UNAVAILABLE, "credential store unreachable")
                .into_response();
        }
    }
    (StatusCode::OK, "ready").into_response()
}

/// Any path outside the surface above is a structured 404.
async fn unknown_route() -> Response {
    AppError::NotFound("unknown route".into()).into_response()
}
