//! # Open-Access Location References
//!
//! The catalog names a work's best open-access copy with a composite
//! string of the form `scheme:native_id` (e.g. `doi:10.1/abc`). The
//! native id is the key used against the secondary mapping index; the
//! scheme says which namespace it belongs to.

use thiserror::Error;

/// Fixed scheme used when a foreign (DOI) identifier supplies the pair
/// directly, without a catalog round trip.
pub const DOI_SCHEME: &str = "doi";

/// A composite reference that violates the `scheme:native_id` shape.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocationError {
    /// No colon, or the colon is the first or last character.
    #[error("malformed location reference {0:?}: expected scheme:native_id")]
    Malformed(String),
}

/// A parsed `scheme:native_id` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationRef {
    /// Namespace of the native identifier (`doi`, `pmid`, ...).
    pub scheme: String,
    /// Scheme-specific key used against the mapping index.
    pub native_id: String,
}

impl LocationRef {
    /// Split a composite string on its **first** colon.
    ///
    /// The colon must exist and be neither the first nor the last
    /// character; anything else is structurally wrong upstream data, not
    /// a transient condition.
    pub fn parse(raw: &str) -> Result<Self, LocationError> {
        match raw.find(':') {
            Some(at) if at > 0 && at + 1 < raw.len() => Ok(Self {
                scheme: raw[..at].to_string(),
                native_id: raw[at + 1..].to_string(),
            }),
            _ => Err(LocationError::Malformed(raw.to_string())),
        }
    }

    /// Build the pair a DOI supplies directly.
    pub fn from_doi(doi: &str) -> Self {
        Self {
            scheme: DOI_SCHEME.to_string(),
            native_id: doi.to_string(),
        }
    }
}

impl std::fmt::Display for LocationRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.scheme, self.native_id)
    }
}
