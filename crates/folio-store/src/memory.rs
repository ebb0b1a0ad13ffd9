//! In-memory doubles for the mapping index and the object tiers.
//!
//! Back the API integration tests and dev mode. Shape-compatible with
//! the production clients, plus the switches tests need: call counters,
//! a fault toggle, and a HEAD-capability toggle.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use parking_lot::RwLock;
use uuid::Uuid;

use folio_core::ArtifactKind;

use crate::error::{IndexError, StoreError};
use crate::index::MappingIndex;
use crate::object::{ArtifactBody, ArtifactStore};

// ── MemoryIndex ─────────────────────────────────────────────────────────

/// In-memory mapping index.
#[derive(Clone, Default)]
pub struct MemoryIndex {
    entries: Arc<RwLock<HashMap<(String, ArtifactKind), Uuid>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mapping.
    pub fn insert(&self, native_id: &str, kind: ArtifactKind, uuid: Uuid) {
        self.entries
            .write()
            .insert((native_id.to_string(), kind), uuid);
    }

    /// Toggle fault injection: every lookup fails with a store fault.
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl MappingIndex for MemoryIndex {
    async fn lookup(
        &self,
        native_id: &str,
        kind: ArtifactKind,
    ) -> Result<Option<Uuid>, IndexError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(IndexError::InvalidRequest {
                detail: "injected index fault".into(),
            });
        }
        Ok(self
            .entries
            .read()
            .get(&(native_id.to_string(), kind))
            .copied())
    }
}

impl std::fmt::Debug for MemoryIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryIndex")
            .field("entries", &self.entries.read().len())
            .finish()
    }
}

// ── MemoryStore ─────────────────────────────────────────────────────────

/// Shared call counters for one [`MemoryStore`].
#[derive(Clone, Default)]
pub struct StoreCounters {
    heads: Arc<AtomicUsize>,
    gets: Arc<AtomicUsize>,
}

impl StoreCounters {
    pub fn heads(&self) -> usize {
        self.heads.load(Ordering::SeqCst)
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

/// In-memory object-store tier.
#[derive(Clone)]
pub struct MemoryStore {
    name: String,
    objects: Arc<RwLock<HashMap<String, Bytes>>>,
    head_supported: bool,
    failing: Arc<AtomicBool>,
    counters: StoreCounters,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objects: Arc::new(RwLock::new(HashMap::new())),
            head_supported: true,
            failing: Arc::new(AtomicBool::new(false)),
            counters: StoreCounters::default(),
        }
    }

    /// Disable the HEAD capability: callers must fall back to GET as an
    /// existence proxy.
    pub fn without_head(mut self) -> Self {
        self.head_supported = false;
        self
    }

    /// Store an object.
    pub fn insert(&self, key: &str, bytes: impl AsRef<[u8]>) {
        self.objects
            .write()
            .insert(key.to_string(), Bytes::copy_from_slice(bytes.as_ref()));
    }

    /// Toggle fault injection: every call fails with a store fault.
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Handle on this store's call counters.
    pub fn counters(&self) -> StoreCounters {
        self.counters.clone()
    }

    fn check_fault(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::InvalidRequest {
                store: self.name.clone(),
                detail: "injected store fault".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_head(&self) -> bool {
        self.head_supported
    }

    async fn head(&self, key: &str) -> Result<bool, StoreError> {
        self.counters.heads.fetch_add(1, Ordering::SeqCst);
        self.check_fault()?;
        Ok(self.objects.read().contains_key(key))
    }

    async fn get(&self, key: &str) -> Result<Option<ArtifactBody>, StoreError> {
        self.counters.gets.fetch_add(1, Ordering::SeqCst);
        self.check_fault()?;
        let Some(bytes) = self.objects.read().get(key).cloned() else {
            return Ok(None);
        };
        Ok(Some(ArtifactBody {
            content_length: Some(bytes.len() as u64),
            stream: Box::pin(stream::once(async move { Ok::<_, StoreError>(bytes) })),
        }))
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("name", &self.name)
            .field("objects", &self.objects.read().len())
            .field("head_supported", &self.head_supported)
            .finish()
    }
}
