//! # Work Resolution Route
//!
//! The single resolution endpoint:
//!
//! ```text
//! GET /v1/works/{identifier...}/{kind}[?metadata][&api_key=...]
//! ```
//!
//! The identifier may contain slashes (DOIs do); the **last** path
//! segment is the artifact kind token (`pdf` or `text`). One pipeline
//! serves both identifier families — canonical short codes resolve
//! through the catalog, DOIs bypass it — and both response modes:
//!
//! - **metadata** (flag present): JSON manifest with every resolved
//!   intermediate value and per-tier existence booleans.
//! - **stream** (default): the artifact bytes, primary tier first,
//!   backup on miss.
//!
//! Pipeline order per request: path shape → normalize → authorize →
//! catalog (unless DOI) → location parse → index lookup → assemble.
//! Authorization failures short-circuit before any external call.

use axum::body::Body;
use axum::extract::{OriginalUri, Path, RawQuery, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use percent_encoding::{percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use url::Url;
use utoipa::ToSchema;
use uuid::Uuid;

use folio_core::{normalize, ArtifactKind, LocationRef, WorkId};
use folio_store::TierAvailability;

use crate::auth;
use crate::error::{AppError, ErrorBody};
use crate::state::AppState;

/// RFC 5987 `attr-char` set: everything else is percent-encoded in the
/// extended `filename*` parameter.
const RFC5987_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// Build the works router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/works/*rest", get(resolve))
}

/// Response mode, selected by the `metadata` query flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Metadata,
    Stream,
}

/// Metadata-mode response: every value the pipeline resolved.
#[derive(Debug, Serialize, ToSchema)]
pub struct WorkManifest {
    /// The identifier exactly as requested.
    pub requested: String,
    /// Normalized work identifier.
    pub work_id: String,
    /// Composite reference of the best open-access location.
    pub location_id: String,
    pub scheme: String,
    pub native_id: String,
    /// Whether the mapping index held an entry for this native id.
    pub mapping_found_in_dynamodb: bool,
    pub file_uuid: Option<Uuid>,
    /// Derived object-store key.
    pub s3_key: Option<String>,
    pub exists_in_s3: bool,
    pub exists_in_backup: bool,
    /// Self-referential download URL with the metadata flag stripped,
    /// present when the artifact exists in at least one tier.
    pub download_url: Option<String>,
}

/// GET /v1/works/{identifier...}/{kind} — resolve and serve.
#[utoipa::path(
    get,
    path = "/v1/works/{rest}",
    params(
        ("rest" = String, Path,
         description = "Work identifier (short code, catalog URL, or DOI) followed by the artifact kind token (`pdf` or `text`)"),
        ("metadata" = Option<String>, Query,
         description = "Presence selects the JSON manifest instead of the byte stream"),
        ("api_key" = Option<String>, Query,
         description = "API credential (alternative: `Authorization: Bearer`)"),
    ),
    responses(
        (status = 200, description = "Artifact stream, or manifest in metadata mode", body = WorkManifest),
        (status = 400, description = "Invalid identifier", body = ErrorBody),
        (status = 401, description = "Missing, unknown, or expired API key", body = ErrorBody),
        (status = 403, description = "API key without payment eligibility", body = ErrorBody),
        (status = 404, description = "Unknown path shape, no open-access location, or artifact absent", body = ErrorBody),
        (status = 500, description = "Index or credential store fault", body = ErrorBody),
        (status = 502, description = "Malformed upstream reference or catalog failure", body = ErrorBody),
    ),
)]
pub async fn resolve(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(rest): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    let params = parse_query(query.as_deref());
    let mode = if params.iter().any(|(name, _)| name == "metadata") {
        Mode::Metadata
    } else {
        Mode::Stream
    };

    match run(&state, &rest, &params, &headers, uri.path(), mode).await {
        Ok(response) => response,
        // Stream-mode errors degrade to their message field alone.
        Err(err) => match mode {
            Mode::Metadata => err.into_response(),
            Mode::Stream => err.into_plain_response(),
        },
    }
}

/// The resolution pipeline. Each stage returns a typed outcome or
/// short-circuits with an [`AppError`].
async fn run(
    state: &AppState,
    rest: &str,
    params: &[(String, String)],
    headers: &HeaderMap,
    path: &str,
    mode: Mode,
) -> Result<Response, AppError> {
    // Path shape first: wrong segment count or kind token misses before
    // any authorization or lookup.
    let (raw_id, kind) = split_path(rest)?;

    let work = normalize(raw_id)?;

    let credential = auth::credential_from(params, headers);
    auth::authorize(state.keys.as_ref(), credential.as_deref()).await?;
    if let Some(key) = &credential {
        // Usage counting is best-effort; a counter failure never fails
        // the request.
        if let Err(e) = state.keys.record_usage(key, Utc::now().date_naive()).await {
            tracing::warn!(error = %e, "failed to record key usage");
        }
    }

    let location = resolve_location(state, &work).await?;

    let mapping = state
        .index
        .lookup(&location.native_id, kind)
        .await
        .map_err(|e| {
            tracing::error!(
                work_id = %work,
                location = %location,
                kind = %kind,
                error = %e,
                "mapping index lookup failed"
            );
            AppError::from(e)
        })?;

    match mode {
        Mode::Metadata => {
            metadata_response(state, raw_id, &work, &location, kind, mapping, path, params).await
        }
        Mode::Stream => stream_response(state, &location, kind, mapping).await,
    }
}

/// Split the wildcard remainder into (identifier, kind).
fn split_path(rest: &str) -> Result<(&str, ArtifactKind), AppError> {
    let (raw_id, token) = rest
        .rsplit_once('/')
        .ok_or_else(|| AppError::NotFound("expected /v1/works/{id}/{kind}".into()))?;
    if raw_id.is_empty() {
        return Err(AppError::NotFound("expected /v1/works/{id}/{kind}".into()));
    }
    let kind = ArtifactKind::from_token(token)
        .ok_or_else(|| AppError::NotFound(format!("unknown artifact kind {token:?}")))?;
    Ok((raw_id, kind))
}

/// Resolve the composite location reference: DOIs supply it directly,
/// short codes go through the catalog.
async fn resolve_location(state: &AppState, work: &WorkId) -> Result<LocationRef, AppError> {
    match work {
        WorkId::Doi(doi) => Ok(LocationRef::from_doi(doi)),
        WorkId::Short(id) => {
            let composite = state
                .catalog
                .best_oa_location(id)
                .await?
                .ok_or_else(|| {
                    AppError::NoOaLocation(format!("no open-access location for {id}"))
                })?;
            Ok(LocationRef::parse(&composite)?)
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn metadata_response(
    state: &AppState,
    requested: &str,
    work: &WorkId,
    location: &LocationRef,
    kind: ArtifactKind,
    mapping: Option<Uuid>,
    path: &str,
    params: &[(String, String)],
) -> Result<Response, AppError> {
    // Tier booleans are informational here: both tiers are probed
    // (concurrently) even when the primary already answers.
    let (s3_key, availability) = match &mapping {
        Some(uuid) => {
            let key = kind.storage_key(uuid);
            let availability = state.tiers.availability(&key).await;
            (Some(key), availability)
        }
        None => (None, TierAvailability::default()),
    };

    let download_url = availability
        .anywhere()
        .then(|| download_url(&state.config.public_base_url, path, params));

    let manifest = WorkManifest {
        requested: requested.to_string(),
        work_id: work.as_str().to_string(),
        location_id: location.to_string(),
        scheme: location.scheme.clone(),
        native_id: location.native_id.clone(),
        mapping_found_in_dynamodb: mapping.is_some(),
        file_uuid: mapping,
        s3_key,
        exists_in_s3: availability.in_primary,
        exists_in_backup: availability.in_backup,
        download_url,
    };

    Ok(Json(manifest).into_response())
}

async fn stream_response(
    state: &AppState,
    location: &LocationRef,
    kind: ArtifactKind,
    mapping: Option<Uuid>,
) -> Result<Response, AppError> {
    let uuid = mapping.ok_or_else(|| {
        AppError::ArtifactAbsent(format!("no archived {kind} for {}", location.native_id))
    })?;
    let key = kind.storage_key(&uuid);

    let Some((tier, body)) = state.tiers.fetch(&key).await else {
        return Err(AppError::ArtifactAbsent(format!(
            "artifact {key} is in neither tier"
        )));
    };

    tracing::info!(
        key = %key,
        tier = tier.as_str(),
        native_id = %location.native_id,
        "streaming artifact"
    );

    let filename = kind.download_filename(&location.native_id);
    let disposition = format!(
        "attachment; filename=\"{filename}\"; filename*=UTF-8''{}",
        percent_encode(filename.as_bytes(), RFC5987_ENCODE)
    );

    // no-store: authorization was checked on this request; downstream
    // caches must not serve the bytes to the next caller.
    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, kind.content_type())
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CACHE_CONTROL, "no-store");
    if let Some(length) = body.content_length {
        response = response.header(header::CONTENT_LENGTH, length);
    }
    response
        .body(Body::from_stream(body.stream))
        .map_err(|e| AppError::Internal(format!("failed to build stream response: {e}")))
}

fn parse_query(raw: Option<&str>) -> Vec<(String, String)> {
    raw.map(|q| {
        url::form_urlencoded::parse(q.as_bytes())
            .into_owned()
            .collect()
    })
    .unwrap_or_default()
}

/// Rebuild the request URL against the public base with the `metadata`
/// flag stripped; every other parameter (notably `api_key`) survives.
fn download_url(base: &Url, path: &str, params: &[(String, String)]) -> String {
    let mut url = base.clone();
    url.set_path(path);
    url.set_query(None);
    let remaining: Vec<_> = params
        .iter()
        .filter(|(name, _)| name != "metadata")
        .collect();
    if !remaining.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (name, value) in remaining {
            pairs.append_pair(name, value);
        }
    }
    url.to_string()
}
