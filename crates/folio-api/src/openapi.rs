//! OpenAPI document, auto-generated from handler and schema derives.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// The Folio API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Folio API",
        description = "Resolves bibliographic work identifiers to harvested \
                       artifacts (PDF or parsed text) and serves them from a \
                       two-tier object store."
    ),
    paths(crate::routes::works::resolve),
    components(schemas(
        crate::routes::works::WorkManifest,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
    ))
)]
pub struct ApiDoc;

/// Serve the generated document at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
}
