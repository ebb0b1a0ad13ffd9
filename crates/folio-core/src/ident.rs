//! # Work Identifier Normalization
//!
//! Parses a raw path segment into a [`WorkId`]. Three accepted shapes,
//! tried in order:
//!
//! 1. A catalog short code — one ASCII letter followed by digits
//!    (`w12345`). The letter is uppercased.
//! 2. A catalog URL whose final path segment is a short code
//!    (`https://openalex.org/w12345`).
//! 3. A DOI — anything beginning `10.` with a non-empty remainder. DOIs
//!    bypass catalog resolution downstream: the DOI itself is the native
//!    identifier, under the fixed `doi` scheme.
//!
//! Anything else is rejected. Normalization is idempotent: feeding a
//! normalized identifier back through [`normalize`] returns it unchanged.

use thiserror::Error;

/// Prefix that marks a foreign (DOI) identifier.
pub const DOI_PREFIX: &str = "10.";

/// A raw path segment that matches none of the accepted identifier shapes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentError {
    /// Not a short code, not a catalog URL, not a DOI.
    #[error("unrecognized work identifier: {0:?}")]
    Invalid(String),
}

/// A normalized bibliographic work identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WorkId {
    /// Canonical catalog short code, letter uppercased (`W12345`).
    Short(String),
    /// Foreign identifier (DOI), kept verbatim (`10.1/abc`).
    Doi(String),
}

impl WorkId {
    /// The identifier as it appears after normalization.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Short(s) | Self::Doi(s) => s,
        }
    }

    /// Whether this identifier skips catalog resolution.
    pub fn is_foreign(&self) -> bool {
        matches!(self, Self::Doi(_))
    }
}

impl std::fmt::Display for WorkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `s` is a short code: one ASCII letter then one or more digits.
fn is_short_code(s: &str) -> bool {
    let mut bytes = s.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_alphabetic() => {}
        _ => return false,
    }
    let rest = &s.as_bytes()[1..];
    !rest.is_empty() && rest.iter().all(u8::is_ascii_digit)
}

/// Uppercase the leading letter of a short code. Only called on strings
/// that already passed [`is_short_code`], so byte-slicing at 1 is safe.
fn canonical_short(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    out.push_str(&s[..1].to_ascii_uppercase());
    out.push_str(&s[1..]);
    out
}

/// Normalize a raw path segment into a [`WorkId`].
pub fn normalize(raw: &str) -> Result<WorkId, IdentError> {
    let trimmed = raw.trim();

    if is_short_code(trimmed) {
        return Ok(WorkId::Short(canonical_short(trimmed)));
    }

    // Catalog URL: the short code is the final non-empty path segment.
    if trimmed.contains('/') {
        if let Some(segment) = trimmed.rsplit('/').find(|s| !s.is_empty()) {
            if is_short_code(segment) {
                return Ok(WorkId::Short(canonical_short(segment)));
            }
        }
    }

    if let Some(rest) = trimmed.strip_prefix(DOI_PREFIX) {
        if !rest.is_empty() {
            return Ok(WorkId::Doi(trimmed.to_string()));
        }
    }

    Err(IdentError::Invalid(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn short_code_is_uppercased() {
        assert_eq!(normalize("w12345").unwrap(), WorkId::Short("W12345".into()));
    }

    #[test]
    fn already_canonical_short_code_unchanged() {
        assert_eq!(normalize("W12345").unwrap(), WorkId::Short("W12345".into()));
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(normalize(" w7 ").unwrap(), WorkId::Short("W7".into()));
    }

    #[test]
    fn catalog_url_final_segment_extracted() {
        assert_eq!(
            normalize("https://openalex.org/w12345").unwrap(),
            WorkId::Short("W12345".into())
        );
    }

    #[test]
    fn catalog_url_with_trailing_slash() {
        assert_eq!(
            normalize("https://openalex.org/w12345/").unwrap(),
            WorkId::Short("W12345".into())
        );
    }

    #[test]
    fn bare_host_and_segment_extracted() {
        assert_eq!(
            normalize("openalex.org/A99").unwrap(),
            WorkId::Short("A99".into())
        );
    }

    #[test]
    fn doi_recognized_verbatim() {
        assert_eq!(
            normalize("10.1234/abc.def").unwrap(),
            WorkId::Doi("10.1234/abc.def".into())
        );
    }

    #[test]
    fn doi_is_foreign() {
        assert!(normalize("10.1/abc").unwrap().is_foreign());
        assert!(!normalize("w1").unwrap().is_foreign());
    }

    #[test]
    fn bare_doi_prefix_rejected() {
        assert!(matches!(normalize("10."), Err(IdentError::Invalid(_))));
    }

    #[test]
    fn garbage_rejected() {
        for raw in ["", "12345", "wx123", "w", "not-an-id", "https://openalex.org/about"] {
            assert!(
                matches!(normalize(raw), Err(IdentError::Invalid(_))),
                "expected rejection for {raw:?}"
            );
        }
    }

    #[test]
    fn digits_only_after_letter() {
        assert!(normalize("w12a45").is_err());
    }

    proptest! {
        /// normalize(normalize(x)) == normalize(x) for every accepted input.
        #[test]
        fn normalization_is_idempotent(letter in "[a-zA-Z]", digits in "[0-9]{1,12}") {
            let raw = format!("{letter}{digits}");
            let once = normalize(&raw).unwrap();
            let twice = normalize(once.as_str()).unwrap();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn doi_normalization_is_idempotent(suffix in "[a-z0-9./-]{1,24}") {
            let raw = format!("10.{suffix}");
            if let Ok(once) = normalize(&raw) {
                let twice = normalize(once.as_str()).unwrap();
                prop_assert_eq!(once, twice);
            }
        }
    }
}
