//! TTL-bounded LRU cache for resolved catalog locations.
//!
//! Caches the *answer* for a work id — including the negative answer
//! "this work has no open-access location" — so repeated resolutions of
//! popular works inside the TTL never re-query the catalog.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

struct CachedAnswer {
    stored_at: Instant,
    location: Option<String>,
}

/// Shared, clonable location cache.
///
/// The lock is `parking_lot`, not `tokio::sync` — it is never held
/// across an `.await` point.
#[derive(Clone)]
pub struct LocationCache {
    inner: Arc<Mutex<LruCache<String, CachedAnswer>>>,
    ttl: Duration,
}

impl LocationCache {
    /// Create a cache holding at most `capacity` answers for `ttl` each.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).expect("capacity clamped to >= 1");
        Self {
            inner: Arc::new(Mutex::new(LruCache::new(cap))),
            ttl,
        }
    }

    /// Look up a cached answer. Outer `None` = miss (absent or expired);
    /// inner `Option` = the cached catalog answer itself.
    pub fn get(&self, work_id: &str) -> Option<Option<String>> {
        let mut cache = self.inner.lock();
        match cache.get(work_id) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                return Some(entry.location.clone());
            }
            None => return None,
            Some(_) => {}
        }
        // Expired: evict so the slot frees up before the next put.
        cache.pop(work_id);
        None
    }

    /// Store an answer for a work id.
    pub fn put(&self, work_id: &str, location: Option<String>) {
        self.inner.lock().put(
            work_id.to_string(),
            CachedAnswer {
                stored_at: Instant::now(),
                location,
            },
        );
    }

    /// Number of live entries (expired entries may still be counted
    /// until their next lookup evicts them).
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
