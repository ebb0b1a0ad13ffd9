//! # Artifact Kinds and Derived Names
//!
//! Folio serves two artifact families per work: the raw harvested PDF
//! and the parsed-text derivative produced by the harvesting pipeline.
//! The kind decides the URL token, the object-store key extension, the
//! response content type, and which mapping-index table is consulted.
//!
//! Storage keys and download filenames are derived per request and never
//! persisted.

use uuid::Uuid;

/// Characters that must not reach a `Content-Disposition` filename.
const FILENAME_UNSAFE: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// The two artifact families Folio serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Raw harvested document.
    Pdf,
    /// Parsed-text derivative of the harvested document.
    Text,
}

impl ArtifactKind {
    /// Parse the URL path token. Unknown tokens are a routing miss, not
    /// an error — callers turn `None` into 404.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "pdf" => Some(Self::Pdf),
            "text" => Some(Self::Text),
            _ => None,
        }
    }

    /// The URL path token.
    pub fn token(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Text => "text",
        }
    }

    /// Extension appended to the artifact UUID to form the storage key.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => ".pdf",
            Self::Text => ".txt",
        }
    }

    /// Content type sent on a successful stream response.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Text => "text/plain; charset=utf-8",
        }
    }

    /// Object-store key for an artifact of this kind.
    pub fn storage_key(&self, uuid: &Uuid) -> String {
        format!("{uuid}{}", self.extension())
    }

    /// Download filename shown to the client: the sanitized native id
    /// plus the kind extension.
    pub fn download_filename(&self, native_id: &str) -> String {
        format!("{}{}", sanitize_filename(native_id), self.extension())
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// Replace every path-unsafe character with `_`, leaving everything else
/// untouched.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if FILENAME_UNSAFE.contains(&c) { '_' } else { c })
        .collect()
}
