//! AWS Signature Version 4 request signing.
//!
//! Both external stores (the DynamoDB mapping index and the
//! S3-compatible object tiers) authenticate requests with SigV4. Folio
//! signs by hand over plain `reqwest` rather than pulling in an SDK:
//! the two call shapes it needs (a single-table `Query` and object
//! HEAD/GET) are small, and the signature algorithm is fixed.
//!
//! Algorithm reference: canonical request → string to sign → derived
//! signing key (`AWS4{secret}` chained through date, region, service,
//! `aws4_request`) → hex HMAC-SHA256 signature.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// SHA-256 of the empty payload, used for HEAD/GET object requests.
pub const EMPTY_PAYLOAD_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Characters *kept* verbatim in URI encoding: RFC 3986 unreserved.
/// `NON_ALPHANUMERIC` minus `-._~`; `/` handling depends on context.
const URI_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const URI_ENCODE_KEEP_SLASH: &AsciiSet = &URI_ENCODE.remove(b'/');

/// Percent-encode a URI path. Object keys keep their `/` separators.
pub fn uri_encode_path(path: &str) -> String {
    percent_encode(path.as_bytes(), URI_ENCODE_KEEP_SLASH).to_string()
}

/// Hex-encoded SHA-256 of a payload.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac =
        <HmacSha256 as Mac>::new_from_slice(key).expect("HMAC-SHA256 accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// The header set produced by signing: attach all three (plus any extra
/// signed headers the caller supplied) to the outgoing request.
#[derive(Debug, Clone)]
pub struct SignatureHeaders {
    /// `x-amz-date` value (`YYYYMMDDTHHMMSSZ`).
    pub amz_date: String,
    /// Full `Authorization` header value.
    pub authorization: String,
    /// Payload hash, echoed as `x-amz-content-sha256` on S3 requests.
    pub payload_hash: String,
}

/// A request in the shape SigV4 canonicalizes.
///
/// `path` must already be URI-encoded ([`uri_encode_path`]); `query`
/// must be the canonical query string (empty for none). `extra_headers`
/// carries lowercase header names with trimmed values; `host` and
/// `x-amz-date` are always signed and must not appear there.
#[derive(Debug, Clone)]
pub struct CanonicalRequest<'a> {
    pub method: &'a str,
    pub host: &'a str,
    pub path: &'a str,
    pub query: &'a str,
    pub extra_headers: &'a [(&'a str, &'a str)],
    pub payload_hash: &'a str,
}

/// Signs requests for one (credentials, region, service) triple.
#[derive(Clone)]
pub struct RequestSigner {
    access_key_id: String,
    secret_access_key: String,
    region: String,
    service: String,
}

impl RequestSigner {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
            service: service.into(),
        }
    }

    /// Sign a request at the given instant.
    pub fn sign(&self, req: &CanonicalRequest<'_>, at: DateTime<Utc>) -> SignatureHeaders {
        let amz_date = at.format("%Y%m%dT%H%M%SZ").to_string();
        let date = at.format("%Y%m%d").to_string();

        // Canonical headers: lowercase names, sorted, trailing newline
        // each. host and x-amz-date are always part of the signed set.
        let mut headers: Vec<(String, String)> = vec![
            ("host".to_string(), req.host.trim().to_string()),
            ("x-amz-date".to_string(), amz_date.clone()),
        ];
        for (name, value) in req.extra_headers {
            headers.push((name.to_ascii_lowercase(), value.trim().to_string()));
        }
        headers.sort();

        let canonical_headers: String = headers
            .iter()
            .map(|(name, value)| format!("{name}:{value}\n"))
            .collect();
        let signed_headers = headers
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(";");

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            req.method, req.path, req.query, canonical_headers, signed_headers, req.payload_hash
        );

        let scope = format!("{date}/{}/{}/aws4_request", self.region, self.service);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{amz_date}\n{scope}\n{}",
            sha256_hex(canonical_request.as_bytes())
        );

        let signature = hex::encode(hmac_sha256(
            &self.signing_key(&date),
            string_to_sign.as_bytes(),
        ));

        let authorization = format!(
            "AWS4-HMAC-SHA256 Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
            self.access_key_id
        );

        SignatureHeaders {
            amz_date,
            authorization,
            payload_hash: req.payload_hash.to_string(),
        }
    }

    /// Derive the per-day signing key.
    fn signing_key(&self, date: &str) -> Vec<u8> {
        let k_date = hmac_sha256(
            format!("AWS4{}", self.secret_access_key).as_bytes(),
            date.as_bytes(),
        );
        let k_region = hmac_sha256(&k_date, self.region.as_bytes());
        let k_service = hmac_sha256(&k_region, self.service.as_bytes());
        hmac_sha256(&k_service, b"aws4_request")
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("region", &self.region)
            .field("service", &self.service)
            .finish()
    }
}
