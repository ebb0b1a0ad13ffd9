//! # folio-catalog — Works Catalog Client
//!
//! Typed reqwest client for the external bibliographic catalog (an
//! OpenAlex-shaped works API). One operation matters to Folio: given a
//! canonical work id, fetch the composite reference naming the work's
//! best open-access copy.
//!
//! ## Request Shape
//!
//! `GET {base}/works/{ID}?select=id,best_oa_location` — only the two
//! fields Folio consumes are requested, and only those two are modeled
//! ([`client::CatalogWork`]). Everything else the catalog returns is
//! ignored by construction.
//!
//! ## Caching
//!
//! Resolved locations (including negative answers) are held in a
//! TTL-bounded LRU ([`cache::LocationCache`], default 300 s) so repeated
//! resolutions of popular works inside the TTL never re-query the
//! catalog.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;

pub use client::CatalogClient;
pub use config::CatalogConfig;
pub use error::CatalogError;
