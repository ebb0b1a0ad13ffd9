//! Secondary mapping index: native id → artifact UUID.
//!
//! The harvesting pipeline records one row per harvested artifact in a
//! DynamoDB table per artifact kind, keyed by the native identifier via
//! a secondary index. Folio performs a single equality `Query` with
//! `Limit: 1` — the first returned item is authoritative (native ids
//! are expected unique per partition; if upstream data violates that,
//! first-returned wins with no ordering guarantee assumed).
//!
//! Absence of a match is the normal "not yet archived" state, not an
//! error. Faults (transport, throttling, unusable items) are typed and
//! carry the table and native id; they are never retried here.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use url::Url;
use uuid::Uuid;

use folio_core::ArtifactKind;

use crate::config::IndexConfig;
use crate::error::IndexError;
use crate::sigv4::{sha256_hex, CanonicalRequest, RequestSigner};

/// Item attribute holding the artifact UUID.
const UUID_ATTR: &str = "file_uuid";

/// Lookup seam between the resolution pipeline and the index store.
#[async_trait]
pub trait MappingIndex: Send + Sync {
    /// Map a native id to the artifact UUID for one kind partition.
    /// `Ok(None)` = not yet archived.
    async fn lookup(
        &self,
        native_id: &str,
        kind: ArtifactKind,
    ) -> Result<Option<Uuid>, IndexError>;
}

/// DynamoDB-backed mapping index.
pub struct DynamoIndex {
    http: reqwest::Client,
    endpoint: Url,
    host_header: String,
    signer: RequestSigner,
    pdf_table: String,
    text_table: String,
    native_id_index: String,
}

impl DynamoIndex {
    /// Create a new index client from configuration.
    pub fn new(config: IndexConfig) -> Result<Self, IndexError> {
        let endpoint = match config.endpoint {
            Some(url) => url,
            None => {
                let default = format!("https://dynamodb.{}.amazonaws.com", config.region);
                Url::parse(&default).map_err(|e| IndexError::InvalidRequest {
                    detail: format!("default endpoint {default:?}: {e}"),
                })?
            }
        };
        let host_header = host_with_port(&endpoint).ok_or_else(|| IndexError::InvalidRequest {
            detail: format!("endpoint {endpoint} has no host"),
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| IndexError::InvalidRequest {
                detail: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            endpoint,
            host_header,
            signer: RequestSigner::new(
                config.credentials.access_key_id,
                config.credentials.secret_access_key,
                config.region,
                "dynamodb",
            ),
            pdf_table: config.pdf_table,
            text_table: config.text_table,
            native_id_index: config.native_id_index,
        })
    }

    fn table(&self, kind: ArtifactKind) -> &str {
        match kind {
            ArtifactKind::Pdf => &self.pdf_table,
            ArtifactKind::Text => &self.text_table,
        }
    }
}

/// One DynamoDB attribute value; only string attributes are consumed.
#[derive(Debug, Deserialize)]
struct AttributeValue {
    #[serde(rename = "S")]
    s: Option<String>,
}

/// The slice of a DynamoDB `Query` response Folio reads.
#[derive(Debug, Deserialize)]
struct QueryOutput {
    #[serde(rename = "Items", default)]
    items: Vec<HashMap<String, AttributeValue>>,
}

#[async_trait]
impl MappingIndex for DynamoIndex {
    async fn lookup(
        &self,
        native_id: &str,
        kind: ArtifactKind,
    ) -> Result<Option<Uuid>, IndexError> {
        let table = self.table(kind).to_string();

        let body = serde_json::json!({
            "TableName": table,
            "IndexName": self.native_id_index,
            "KeyConditionExpression": "native_id = :nid",
            "ExpressionAttributeValues": { ":nid": { "S": native_id } },
            "Limit": 1,
        });
        let payload = serde_json::to_vec(&body).map_err(|e| IndexError::InvalidRequest {
            detail: format!("failed to encode query: {e}"),
        })?;
        let payload_hash = sha256_hex(&payload);

        let signed = self.signer.sign(
            &CanonicalRequest {
                method: "POST",
                host: &self.host_header,
                path: "/",
                query: "",
                extra_headers: &[
                    ("content-type", "application/x-amz-json-1.0"),
                    ("x-amz-target", "DynamoDB_20120810.Query"),
                ],
                payload_hash: &payload_hash,
            },
            Utc::now(),
        );

        let resp = self
            .http
            .post(self.endpoint.clone())
            .header("content-type", "application/x-amz-json-1.0")
            .header("x-amz-target", "DynamoDB_20120810.Query")
            .header("x-amz-date", &signed.amz_date)
            .header("authorization", &signed.authorization)
            .body(payload)
            .send()
            .await
            .map_err(|e| IndexError::Http {
                table: table.clone(),
                native_id: native_id.to_string(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(IndexError::Api {
                table,
                native_id: native_id.to_string(),
                status,
                body,
            });
        }

        let output: QueryOutput = resp.json().await.map_err(|e| IndexError::Malformed {
            table: table.clone(),
            native_id: native_id.to_string(),
            detail: format!("unparseable query response: {e}"),
        })?;

        // First match wins; zero matches is the normal "not yet
        // archived" state.
        let Some(item) = output.items.into_iter().next() else {
            return Ok(None);
        };

        let raw = item
            .get(UUID_ATTR)
            .and_then(|attr| attr.s.as_deref())
            .ok_or_else(|| IndexError::Malformed {
                table: table.clone(),
                native_id: native_id.to_string(),
                detail: format!("item has no string attribute {UUID_ATTR:?}"),
            })?;

        let uuid = Uuid::parse_str(raw).map_err(|e| IndexError::Malformed {
            table,
            native_id: native_id.to_string(),
            detail: format!("attribute {UUID_ATTR:?} is not a UUID: {e}"),
        })?;

        Ok(Some(uuid))
    }
}

impl std::fmt::Debug for DynamoIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoIndex")
            .field("endpoint", &self.endpoint.as_str())
            .field("pdf_table", &self.pdf_table)
            .field("text_table", &self.text_table)
            .field("native_id_index", &self.native_id_index)
            .finish_non_exhaustive()
    }
}

/// Host header value for an endpoint: `host` or `host:port` for
/// non-default ports. The signed host must match what the HTTP client
/// sends on the wire.
pub(crate) fn host_with_port(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}
