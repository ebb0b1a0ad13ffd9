//! End-to-end pipeline tests over the assembled router.
//!
//! The catalog is a wiremock server; the mapping index, both object
//! tiers, and the credential store are the in-memory doubles from
//! `folio-store` / `folio-api`. Requests go through `tower::oneshot`
//! against the real router, so routing, the credential gate, and both
//! response assemblers are all exercised.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use folio_api::keystore::{ApiKeyRecord, MemoryKeyStore};
use folio_api::state::{AppConfig, AppState};
use folio_catalog::{CatalogClient, CatalogConfig};
use folio_core::ArtifactKind;
use folio_store::{MemoryIndex, MemoryStore, TieredStore};

struct Harness {
    app: axum::Router,
    index: MemoryIndex,
    primary: MemoryStore,
    backup: MemoryStore,
    keys: MemoryKeyStore,
}

fn paying_key(key: &str) -> ApiKeyRecord {
    ApiKeyRecord {
        key: key.to_string(),
        expires_at: None,
        is_paying: true,
        requests_per_day: Some(10_000),
        organization: Some("Test University".into()),
        email: None,
    }
}

/// Build a router over a wiremock catalog plus in-memory doubles.
/// A paying key `k-paying` is pre-provisioned.
fn harness(catalog_uri: &str) -> Harness {
    let index = MemoryIndex::new();
    let primary = MemoryStore::new("primary");
    let backup = MemoryStore::new("backup");
    let keys = MemoryKeyStore::new();
    keys.insert(paying_key("k-paying"));

    let catalog =
        CatalogClient::new(CatalogConfig::local_mock(catalog_uri).unwrap()).unwrap();
    let state = AppState::new(
        catalog,
        Arc::new(index.clone()),
        TieredStore::new(Arc::new(primary.clone()), Arc::new(backup.clone())),
        Arc::new(keys.clone()),
        None,
        AppConfig::default(),
    );

    Harness {
        app: folio_api::app(state),
        index,
        primary,
        backup,
        keys,
    }
}

async fn get(harness: &Harness, uri: &str) -> axum::response::Response {
    harness
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Mount a catalog answer for a work id.
async fn mount_catalog(server: &MockServer, work_id: &str, location_id: Option<&str>) {
    let body = match location_id {
        Some(id) => serde_json::json!({
            "id": format!("https://openalex.org/{work_id}"),
            "best_oa_location": { "id": id },
        }),
        None => serde_json::json!({
            "id": format!("https://openalex.org/{work_id}"),
            "best_oa_location": null,
        }),
    };
    Mock::given(method("GET"))
        .and(path(format!("/works/{work_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

// ── Metadata mode ───────────────────────────────────────────────────────

#[tokio::test]
async fn metadata_mode_reports_unmapped_work_as_not_archived() {
    let catalog = MockServer::start().await;
    mount_catalog(&catalog, "W12345", Some("doi:10.1/abc")).await;
    let h = harness(&catalog.uri());

    let response = get(&h, "/v1/works/w12345/pdf?metadata&api_key=k-paying").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["requested"], "w12345");
    assert_eq!(body["work_id"], "W12345");
    assert_eq!(body["location_id"], "doi:10.1/abc");
    assert_eq!(body["scheme"], "doi");
    assert_eq!(body["native_id"], "10.1/abc");
    assert_eq!(body["mapping_found_in_dynamodb"], false);
    assert_eq!(body["file_uuid"], serde_json::Value::Null);
    assert_eq!(body["s3_key"], serde_json::Value::Null);
    assert_eq!(body["exists_in_s3"], false);
    assert_eq!(body["exists_in_backup"], false);
    assert_eq!(body["download_url"], serde_json::Value::Null);
}

#[tokio::test]
async fn metadata_mode_probes_both_tiers_and_derives_download_url() {
    let catalog = MockServer::start().await;
    mount_catalog(&catalog, "W12345", Some("doi:10.1/abc")).await;
    let h = harness(&catalog.uri());

    let uuid = Uuid::new_v4();
    h.index.insert("10.1/abc", ArtifactKind::Pdf, uuid);
    let key = format!("{uuid}.pdf");
    h.primary.insert(&key, b"%PDF");

    let response = get(&h, "/v1/works/w12345/pdf?metadata=1&api_key=k-paying").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["mapping_found_in_dynamodb"], true);
    assert_eq!(body["file_uuid"], uuid.to_string());
    assert_eq!(body["s3_key"], key);
    assert_eq!(body["exists_in_s3"], true);
    assert_eq!(body["exists_in_backup"], false);
    // The metadata flag is stripped; api_key survives.
    assert_eq!(
        body["download_url"],
        "http://localhost:8080/v1/works/w12345/pdf?api_key=k-paying"
    );
}

#[tokio::test]
async fn metadata_mode_checks_backup_even_when_primary_hits() {
    let catalog = MockServer::start().await;
    mount_catalog(&catalog, "W1", Some("doi:10.1/both")).await;
    let h = harness(&catalog.uri());

    let uuid = Uuid::new_v4();
    h.index.insert("10.1/both", ArtifactKind::Pdf, uuid);
    let key = format!("{uuid}.pdf");
    h.primary.insert(&key, b"hot");
    h.backup.insert(&key, b"cold");
    let backup_counters = h.backup.counters();

    let response = get(&h, "/v1/works/w1/pdf?metadata&api_key=k-paying").await;
    let body = json_body(response).await;
    assert_eq!(body["exists_in_s3"], true);
    assert_eq!(body["exists_in_backup"], true);
    assert!(
        backup_counters.heads() >= 1,
        "backup must be probed even on a primary hit"
    );
}

#[tokio::test]
async fn metadata_mode_mapping_without_artifact_has_no_download_url() {
    let catalog = MockServer::start().await;
    mount_catalog(&catalog, "W9", Some("doi:10.1/lost")).await;
    let h = harness(&catalog.uri());

    h.index.insert("10.1/lost", ArtifactKind::Pdf, Uuid::new_v4());

    let body = json_body(get(&h, "/v1/works/w9/pdf?metadata&api_key=k-paying").await).await;
    assert_eq!(body["mapping_found_in_dynamodb"], true);
    assert_eq!(body["exists_in_s3"], false);
    assert_eq!(body["exists_in_backup"], false);
    assert_eq!(body["download_url"], serde_json::Value::Null);
}

// ── Stream mode ─────────────────────────────────────────────────────────

#[tokio::test]
async fn doi_request_streams_from_backup_without_touching_the_catalog() {
    // No catalog mocks mounted: a catalog call would resolve to a 404
    // answer and fail this test with NO_OA_LOCATION.
    let catalog = MockServer::start().await;
    let h = harness(&catalog.uri());

    let uuid = Uuid::new_v4();
    h.index.insert("10.1/abc", ArtifactKind::Pdf, uuid);
    h.backup.insert(&format!("{uuid}.pdf"), b"cold bytes");

    let response = get(&h, "/v1/works/10.1/abc/pdf?api_key=k-paying").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/pdf"
    );
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("attachment"));
    assert!(disposition.contains("filename=\"10.1_abc.pdf\""));
    assert!(disposition.contains("filename*=UTF-8''10.1_abc.pdf"));
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "10");

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"cold bytes");
    assert_eq!(catalog.received_requests().await.unwrap().len(), 0);
}

#[tokio::test]
async fn primary_hit_streams_without_touching_backup() {
    let catalog = MockServer::start().await;
    let h = harness(&catalog.uri());

    let uuid = Uuid::new_v4();
    h.index.insert("10.1/abc", ArtifactKind::Text, uuid);
    h.primary.insert(&format!("{uuid}.txt"), b"parsed text");
    h.backup.insert(&format!("{uuid}.txt"), b"stale copy");
    let backup_counters = h.backup.counters();

    let response = get(&h, "/v1/works/10.1/abc/text?api_key=k-paying").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"parsed text");
    assert_eq!(backup_counters.gets(), 0);
    assert_eq!(backup_counters.heads(), 0);
}

#[tokio::test]
async fn unmapped_identifier_is_404_in_stream_mode() {
    let catalog = MockServer::start().await;
    let h = harness(&catalog.uri());

    let response = get(&h, "/v1/works/10.1/unarchived/pdf?api_key=k-paying").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    // Stream-mode errors are plain text, message only.
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(!text.starts_with('{'));
    assert!(text.contains("10.1/unarchived"));
}

#[tokio::test]
async fn mapped_but_missing_artifact_is_404() {
    let catalog = MockServer::start().await;
    let h = harness(&catalog.uri());

    h.index.insert("10.1/abc", ArtifactKind::Pdf, Uuid::new_v4());

    let response = get(&h, "/v1/works/10.1/abc/pdf?api_key=k-paying").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ── Authorization ───────────────────────────────────────────────────────

#[tokio::test]
async fn missing_key_is_401() {
    let catalog = MockServer::start().await;
    let h = harness(&catalog.uri());

    let response = get(&h, "/v1/works/w12345/pdf?metadata").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn unknown_key_is_401_not_found() {
    let catalog = MockServer::start().await;
    let h = harness(&catalog.uri());

    let response = get(&h, "/v1/works/w12345/pdf?metadata&api_key=bogus").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert!(body["error"]["message"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn expired_key_message_carries_the_expiry_timestamp() {
    let catalog = MockServer::start().await;
    let h = harness(&catalog.uri());

    let expires_at = Utc::now() - Duration::days(3);
    let mut record = paying_key("k-expired");
    record.expires_at = Some(expires_at);
    h.keys.insert(record);

    let response = get(&h, "/v1/works/w12345/pdf?metadata&api_key=k-expired").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("expired on"));
    assert!(message.contains(&expires_at.to_rfc3339()));
}

#[tokio::test]
async fn non_paying_key_is_403_before_any_catalog_call() {
    let catalog = MockServer::start().await;
    let h = harness(&catalog.uri());

    let mut record = paying_key("k-free");
    record.is_paying = false;
    h.keys.insert(record);

    let response = get(&h, "/v1/works/w12345/pdf?metadata&api_key=k-free").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "PAYMENT_INELIGIBLE");
    // Authorization failures short-circuit before external calls.
    assert_eq!(catalog.received_requests().await.unwrap().len(), 0);
}

#[tokio::test]
async fn bearer_header_is_accepted_as_credential() {
    let catalog = MockServer::start().await;
    mount_catalog(&catalog, "W5", Some("doi:10.1/abc")).await;
    let h = harness(&catalog.uri());

    let response = h
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/works/w5/pdf?metadata")
                .header(header::AUTHORIZATION, "Bearer k-paying")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn query_key_wins_over_bearer_header() {
    let catalog = MockServer::start().await;
    let h = harness(&catalog.uri());

    // Header is valid, query key is bogus: the query must win → 401.
    let response = h
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/works/w5/pdf?metadata&api_key=bogus")
                .header(header::AUTHORIZATION, "Bearer k-paying")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn successful_request_counts_daily_usage() {
    let catalog = MockServer::start().await;
    mount_catalog(&catalog, "W5", Some("doi:10.1/abc")).await;
    let h = harness(&catalog.uri());

    let before = h.keys.usage_for("k-paying", Utc::now().date_naive());
    let response = get(&h, "/v1/works/w5/pdf?metadata&api_key=k-paying").await;
    assert_eq!(response.status(), StatusCode::OK);
    let after = h.keys.usage_for("k-paying", Utc::now().date_naive());
    assert_eq!(after, before + 1);
}

// ── Path shape & identifier handling ────────────────────────────────────

#[tokio::test]
async fn unknown_path_shape_is_404_before_authorization() {
    let catalog = MockServer::start().await;
    let h = harness(&catalog.uri());
    // A failing key store proves the gate is never consulted.
    h.keys.fail(true);

    let missing_kind = get(&h, "/v1/works/w12345?metadata").await;
    assert_eq!(missing_kind.status(), StatusCode::NOT_FOUND);

    let bad_kind = get(&h, "/v1/works/w12345/epub?metadata").await;
    assert_eq!(bad_kind.status(), StatusCode::NOT_FOUND);
    let body = json_body(bad_kind).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn invalid_identifier_is_400() {
    let catalog = MockServer::start().await;
    let h = harness(&catalog.uri());

    let response = get(&h, "/v1/works/not-an-id/pdf?metadata&api_key=k-paying").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "INVALID_IDENTIFIER");
}

#[tokio::test]
async fn non_get_methods_are_405() {
    let catalog = MockServer::start().await;
    let h = harness(&catalog.uri());

    let response = h
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/works/w12345/pdf")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// ── Upstream failure mapping ────────────────────────────────────────────

#[tokio::test]
async fn work_without_oa_location_is_404() {
    let catalog = MockServer::start().await;
    mount_catalog(&catalog, "W777", None).await;
    let h = harness(&catalog.uri());

    let response = get(&h, "/v1/works/w777/pdf?metadata&api_key=k-paying").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "NO_OA_LOCATION");
}

#[tokio::test]
async fn malformed_upstream_reference_is_502() {
    let catalog = MockServer::start().await;
    // No colon in the composite reference: structurally wrong upstream
    // data, terminal.
    mount_catalog(&catalog, "W666", Some("doi10.1abc")).await;
    let h = harness(&catalog.uri());

    let response = get(&h, "/v1/works/w666/pdf?metadata&api_key=k-paying").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "MALFORMED_LOCATION");
}

#[tokio::test]
async fn catalog_transport_failure_is_502() {
    let catalog = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/works/W503"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&catalog)
        .await;
    let h = harness(&catalog.uri());

    let response = get(&h, "/v1/works/w503/pdf?metadata&api_key=k-paying").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");
}

#[tokio::test]
async fn index_fault_is_a_generic_500() {
    let catalog = MockServer::start().await;
    let h = harness(&catalog.uri());
    h.index.fail(true);

    let response = get(&h, "/v1/works/10.1/abc/pdf?metadata&api_key=k-paying").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "INDEX_FAULT");
    assert!(
        !body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("injected"),
        "index fault detail must not leak"
    );
}

#[tokio::test]
async fn key_store_fault_is_500_not_401() {
    let catalog = MockServer::start().await;
    let h = harness(&catalog.uri());
    h.keys.fail(true);

    let response = get(&h, "/v1/works/w1/pdf?metadata&api_key=k-paying").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
}

// ── Ambient surface ─────────────────────────────────────────────────────

#[tokio::test]
async fn health_probes_answer_without_credentials() {
    let catalog = MockServer::start().await;
    let h = harness(&catalog.uri());

    let liveness = get(&h, "/health/liveness").await;
    assert_eq!(liveness.status(), StatusCode::OK);

    let readiness = get(&h, "/health/readiness").await;
    assert_eq!(readiness.status(), StatusCode::OK);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let catalog = MockServer::start().await;
    let h = harness(&catalog.uri());

    let response = get(&h, "/openapi.json").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["paths"].get("/v1/works/{rest}").is_some());
}

#[tokio::test]
async fn unknown_route_is_a_structured_404() {
    let catalog = MockServer::start().await;
    let h = harness(&catalog.uri());

    let response = get(&h, "/v2/nothing-here").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}
