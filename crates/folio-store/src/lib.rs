//! # folio-store — External Storage Plumbing
//!
//! Everything Folio needs to talk to its two external storage systems:
//!
//! - **Mapping index** ([`index`]) — a DynamoDB-backed secondary index
//!   mapping a native identifier (usually a DOI) to the opaque UUID of a
//!   harvested artifact, partitioned by artifact kind.
//! - **Object tiers** ([`object`], [`tiered`]) — the hot primary bucket
//!   and the cold backup bucket holding the same artifact under the same
//!   derived key. Retrieval tries primary first and falls back to the
//!   backup, whose requests are SigV4-signed with region-aware
//!   virtual-hosted addressing.
//!
//! Both protocols ride on plain `reqwest` with AWS Signature V4 signing
//! ([`sigv4`]) — no SDK. In-memory doubles for both live in [`memory`]
//! and back the API integration tests and dev mode.
//!
//! ## Fault Folding
//!
//! Tier probes and fetches never surface transport faults to callers:
//! 403 and 404 fold to "absent" (the backup cannot distinguish the two),
//! any other unexpected status or transport error is logged at `warn`
//! and likewise treated as absent. No retries anywhere. The mapping
//! index is the opposite: its faults are loud, typed, and carry the
//! table and native id for diagnosis.

pub mod config;
pub mod error;
pub mod index;
pub mod memory;
pub mod object;
pub mod sigv4;
pub mod tiered;

pub use config::{IndexConfig, ObjectStoreConfig, StoreCredentials};
pub use error::{IndexError, StoreError};
pub use index::{DynamoIndex, MappingIndex};
pub use memory::{MemoryIndex, MemoryStore};
pub use object::{ArtifactBody, ArtifactStore, HttpObjectStore};
pub use tiered::{Tier, TierAvailability, TieredStore};
