//! Two-tier artifact retrieval.
//!
//! Fixed order: primary (hot) first, backup (cold) second, short-circuit
//! on the first hit. No tier is retried within a request; a transient
//! fault on a tier is treated as absence — an accepted simplification,
//! kept visible through `warn` logs rather than response changes.

use std::sync::Arc;

use crate::object::{ArtifactBody, ArtifactStore};

/// Per-tier existence answer, computed only in metadata mode. The
/// booleans are independent — an artifact can be in both tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TierAvailability {
    pub in_primary: bool,
    pub in_backup: bool,
}

impl TierAvailability {
    /// Whether at least one tier holds the artifact.
    pub fn anywhere(&self) -> bool {
        self.in_primary || self.in_backup
    }
}

/// Which tier served a fetched artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Primary,
    Backup,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Backup => "backup",
        }
    }
}

/// The two artifact tiers behind one retrieval front.
#[derive(Clone)]
pub struct TieredStore {
    primary: Arc<dyn ArtifactStore>,
    backup: Arc<dyn ArtifactStore>,
}

impl TieredStore {
    pub fn new(primary: Arc<dyn ArtifactStore>, backup: Arc<dyn ArtifactStore>) -> Self {
        Self { primary, backup }
    }

    /// Existence probe for one store: HEAD when the store supports it,
    /// else a full GET used as an existence proxy. Faults fold to
    /// absent.
    async fn probe(store: &dyn ArtifactStore, key: &str) -> bool {
        if store.supports_head() {
            match store.head(key).await {
                Ok(present) => present,
                Err(e) => {
                    tracing::warn!(store = store.name(), key, error = %e,
                        "existence probe failed — treating as absent");
                    false
                }
            }
        } else {
            match store.get(key).await {
                Ok(body) => body.is_some(),
                Err(e) => {
                    tracing::warn!(store = store.name(), key, error = %e,
                        "existence fetch failed — treating as absent");
                    false
                }
            }
        }
    }

    /// Probe both tiers. The two probes are independent and run
    /// concurrently; correctness does not depend on their ordering.
    pub async fn availability(&self, key: &str) -> TierAvailability {
        let (in_primary, in_backup) = tokio::join!(
            Self::probe(self.primary.as_ref(), key),
            Self::probe(self.backup.as_ref(), key),
        );
        TierAvailability {
            in_primary,
            in_backup,
        }
    }

    /// Fetch the artifact body: primary first, then backup, stopping at
    /// the first hit. A primary hit never touches the backup.
    pub async fn fetch(&self, key: &str) -> Option<(Tier, ArtifactBody)> {
        for (tier, store) in [
            (Tier::Primary, self.primary.as_ref()),
            (Tier::Backup, self.backup.as_ref()),
        ] {
            match store.get(key).await {
                Ok(Some(body)) => {
                    tracing::debug!(store = store.name(), key, "artifact served");
                    return Some((tier, body));
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(store = store.name(), key, error = %e,
                        "tier fetch failed — treating as absent");
                }
            }
        }
        None
    }
}

impl std::fmt::Debug for TieredStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredStore")
            .field("primary", &self.primary.name())
            .field("backup", &self.backup.name())
            .finish()
    }
}
