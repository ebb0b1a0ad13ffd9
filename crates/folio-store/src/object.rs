//! S3-compatible object-store client used for both artifact tiers.
//!
//! Requests are SigV4-signed (`service = s3`) with either path-style or
//! virtual-hosted-style addressing. HEAD answers existence; GET streams
//! the object body.
//!
//! ## Status Folding
//!
//! 200 ⇒ present. 403 and 404 ⇒ absent — the backup store answers 403
//! for missing keys as well as permission problems, so the two are
//! deliberately indistinguishable here. Any other status is logged as
//! unexpected and treated as absent, never surfaced as an error.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use url::Url;

use crate::config::ObjectStoreConfig;
use crate::error::StoreError;
use crate::index::host_with_port;
use crate::sigv4::{uri_encode_path, CanonicalRequest, RequestSigner, EMPTY_PAYLOAD_SHA256};

/// A fetched artifact: the upstream content length (when the store
/// supplied one) and the byte stream.
pub struct ArtifactBody {
    pub content_length: Option<u64>,
    pub stream: BoxStream<'static, Result<Bytes, StoreError>>,
}

impl ArtifactBody {
    /// Drain the stream into memory. Test helper — production code
    /// forwards the stream without buffering.
    pub async fn into_bytes(mut self) -> Result<Vec<u8>, StoreError> {
        let mut out = Vec::new();
        while let Some(chunk) = self.stream.next().await {
            out.extend_from_slice(&chunk?);
        }
        Ok(out)
    }
}

impl std::fmt::Debug for ArtifactBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactBody")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// One artifact tier.
///
/// Implementations may or may not support a lightweight existence
/// probe; callers check [`supports_head`](ArtifactStore::supports_head)
/// and fall back to a full [`get`](ArtifactStore::get) as an existence
/// proxy when they must.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Whether [`head`](ArtifactStore::head) is available on this store.
    fn supports_head(&self) -> bool;

    /// Lightweight existence probe.
    async fn head(&self, key: &str) -> Result<bool, StoreError>;

    /// Fetch the object body. `Ok(None)` = absent (including the folded
    /// 403/unexpected-status cases).
    async fn get(&self, key: &str) -> Result<Option<ArtifactBody>, StoreError>;
}

/// SigV4-signed S3-compatible store client.
pub struct HttpObjectStore {
    name: String,
    http: reqwest::Client,
    scheme: String,
    host_header: String,
    /// Canonical path prefix: `""` for virtual-hosted, `"/{bucket}"`
    /// for path-style.
    path_prefix: String,
    signer: RequestSigner,
}

impl HttpObjectStore {
    /// Create a store client from one tier's configuration.
    pub fn new(config: ObjectStoreConfig) -> Result<Self, StoreError> {
        let endpoint = match &config.endpoint {
            Some(url) => url.clone(),
            None => {
                let default = format!("https://s3.{}.amazonaws.com", config.region);
                Url::parse(&default).map_err(|e| StoreError::InvalidRequest {
                    store: config.name.clone(),
                    detail: format!("default endpoint {default:?}: {e}"),
                })?
            }
        };
        let endpoint_host =
            host_with_port(&endpoint).ok_or_else(|| StoreError::InvalidRequest {
                store: config.name.clone(),
                detail: format!("endpoint {endpoint} has no host"),
            })?;

        // Virtual-hosted addressing puts the bucket in the hostname;
        // path-style puts it as the leading path segment.
        let (host_header, path_prefix) = if config.virtual_hosted {
            (format!("{}.{endpoint_host}", config.bucket), String::new())
        } else {
            (endpoint_host, format!("/{}", config.bucket))
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::InvalidRequest {
                store: config.name.clone(),
                detail: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            name: config.name,
            http,
            scheme: endpoint.scheme().to_string(),
            host_header,
            path_prefix,
            signer: RequestSigner::new(
                config.credentials.access_key_id,
                config.credentials.secret_access_key,
                config.region,
                "s3",
            ),
        })
    }

    /// Canonical path and full URL for an object key.
    fn object_location(&self, key: &str) -> (String, String) {
        let path = format!("{}/{}", self.path_prefix, uri_encode_path(key));
        let url = format!("{}://{}{path}", self.scheme, self.host_header);
        (path, url)
    }

    /// Send a signed HEAD or GET for a key.
    async fn send_signed(
        &self,
        method: &str,
        key: &str,
    ) -> Result<reqwest::Response, StoreError> {
        let (path, url) = self.object_location(key);
        let signed = self.signer.sign(
            &CanonicalRequest {
                method,
                host: &self.host_header,
                path: &path,
                query: "",
                extra_headers: &[("x-amz-content-sha256", EMPTY_PAYLOAD_SHA256)],
                payload_hash: EMPTY_PAYLOAD_SHA256,
            },
            Utc::now(),
        );

        let request = match method {
            "HEAD" => self.http.head(&url),
            _ => self.http.get(&url),
        };

        request
            .header("x-amz-date", &signed.amz_date)
            .header("x-amz-content-sha256", EMPTY_PAYLOAD_SHA256)
            .header("authorization", &signed.authorization)
            .send()
            .await
            .map_err(|e| StoreError::Http {
                store: self.name.clone(),
                key: key.to_string(),
                source: e,
            })
    }

    /// Apply the tier status folding: 200 ⇒ present, 403/404 ⇒ absent,
    /// anything else ⇒ logged and absent.
    fn present(&self, status: reqwest::StatusCode, key: &str) -> bool {
        match status.as_u16() {
            200 => true,
            403 | 404 => false,
            other => {
                tracing::warn!(
                    store = %self.name,
                    key,
                    status = other,
                    "unexpected object store status — treating as absent"
                );
                false
            }
        }
    }
}

#[async_trait]
impl ArtifactStore for HttpObjectStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_head(&self) -> bool {
        true
    }

    async fn head(&self, key: &str) -> Result<bool, StoreError> {
        let resp = self.send_signed("HEAD", key).await?;
        Ok(self.present(resp.status(), key))
    }

    async fn get(&self, key: &str) -> Result<Option<ArtifactBody>, StoreError> {
        let resp = self.send_signed("GET", key).await?;
        if !self.present(resp.status(), key) {
            return Ok(None);
        }

        let content_length = resp.content_length();
        let store = self.name.clone();
        let owned_key = key.to_string();
        let stream = resp
            .bytes_stream()
            .map_err(move |e| StoreError::Http {
                store: store.clone(),
                key: owned_key.clone(),
                source: e,
            })
            .boxed();

        Ok(Some(ArtifactBody {
            content_length,
            stream,
        }))
    }
}

impl std::fmt::Debug for HttpObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpObjectStore")
            .field("name", &self.name)
            .field("host", &self.host_header)
            .field("path_prefix", &self.path_prefix)
            .finish_non_exhaustive()
    }
}
