//! LRU cache of finalized payment acceptances.
//!
//! A finalized transaction cannot change, so its acceptance can be served without asking the
//! ledger again. Pending acceptances and rejections are never cached.

use std::{num::NonZeroUsize, sync::Arc};

use lru::LruCache;
use parking_lot::Mutex;
use x402_move_core::verifier::{Acceptance, Settlement};

/// Default cache capacity.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// LRU cache of acceptances keyed by proof.
///
/// Clones share the same entries.
#[derive(Debug, Clone)]
pub struct VerdictCache {
    inner: Arc<Mutex<LruCache<String, Acceptance>>>,
    stats: Arc<Mutex<CacheStats>>,
}

/// Cache statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub additions: u64,
}

impl CacheStats {
    /// Hit rate as a percentage.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

impl VerdictCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// A cache holding at most `capacity` entries. A capacity of `0` holds one entry.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        VerdictCache {
            inner: Arc::new(Mutex::new(LruCache::new(capacity))),
            stats: Arc::new(Mutex::new(CacheStats::default())),
        }
    }

    /// The cached acceptance for `proof`, if any.
    pub fn get(&self, proof: &str) -> Option<Acceptance> {
        let found = self.inner.lock().get(proof).cloned();

        let mut stats = self.stats.lock();
        if found.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }

        found
    }

    /// Cache an acceptance. Returns `false`, and caches nothing, unless it is final.
    pub fn insert(&self, proof: &str, acceptance: &Acceptance) -> bool {
        if acceptance.settlement != Settlement::Final {
            return false;
        }

        self.inner
            .lock()
            .put(proof.to_string(), acceptance.clone());
        self.stats.lock().additions += 1;
        true
    }

    pub fn stats(&self) -> CacheStats {
        *self.stats.lock()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

impl Default for VerdictCache {
    fn default() -> Self {
        Self::new()
    }
}
