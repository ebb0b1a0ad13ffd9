//! # folio-core — Foundational Types for Folio
//!
//! Domain primitives shared by every other Folio crate:
//!
//! - [`WorkId`] — a normalized bibliographic work identifier, either a
//!   canonical catalog short code (`W12345`) or a foreign DOI (`10.1/abc`).
//! - [`LocationRef`] — the `scheme:native_id` pair naming a work's best
//!   open-access copy.
//! - [`ArtifactKind`] — the two artifact families Folio serves: the raw
//!   harvested PDF and its parsed-text derivative. Drives storage keys,
//!   content types, and download filenames.
//!
//! ## Crate Policy
//!
//! - No I/O, no async, no clients — pure data and validation.
//! - Every identifier validates at construction; downstream crates never
//!   see an unvalidated work id or location reference.

pub mod artifact;
pub mod ident;
pub mod location;

pub use artifact::ArtifactKind;
pub use ident::{normalize, IdentError, WorkId};
pub use location::{LocationError, LocationRef};
