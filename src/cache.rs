//! Cache of lifted closure bodies.
//!
//! Entries hold the value-independent lift of a closure site: the raw tree
//! with `Capture` nodes still in place and the declared arguments. Captured
//! values differ from call to call, so substitution and simplification run on
//! a copy of the cached tree for every analysis. Failed lifts are not stored.

use parking_lot::RwLock;
use quarry_bytecode::ClosureSite;
use quarry_lifter::{Analysis, LiftResult};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// A stored lift.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedLift {
    pub analysis: Analysis,
    /// Number of captured slots the body was lifted with.
    pub capture_count: usize,
}

/// Observer of cache lookups.
pub trait CacheListener: Send + Sync {
    fn on_hit(&self, _site: &ClosureSite) {}

    fn on_miss(&self, _site: &ClosureSite) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
pub struct AnalysisCache {
    entries: RwLock<FxHashMap<ClosureSite, Arc<CachedLift>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    listeners: RwLock<Vec<(ListenerId, Arc<dyn CacheListener>)>>,
    next_listener: AtomicU64,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached lift of `site`, computing and storing it with `lift` on a
    /// miss. The lock is not held while `lift` runs; when two threads miss on
    /// the same site, the first stored entry is kept.
    pub fn get_or_lift<F>(&self, site: &ClosureSite, lift: F) -> LiftResult<Arc<CachedLift>>
    where
        F: FnOnce() -> LiftResult<CachedLift>,
    {
        if let Some(entry) = self.entries.read().get(site).cloned() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(%site, "analysis cache hit");
            self.notify(|listener| listener.on_hit(site));
            return Ok(entry);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(%site, "analysis cache miss");
        self.notify(|listener| listener.on_miss(site));

        let lifted = Arc::new(lift()?);
        let mut entries = self.entries.write();
        let entry = entries.entry(site.clone()).or_insert(lifted);
        Ok(Arc::clone(entry))
    }

    pub fn get(&self, site: &ClosureSite) -> Option<Arc<CachedLift>> {
        self.entries.read().get(site).cloned()
    }

    pub fn contains(&self, site: &ClosureSite) -> bool {
        self.entries.read().contains_key(site)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn cache_hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Zero the hit and miss counters. Entries are kept.
    pub fn reset_hit_counters(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn add_listener(&self, listener: Arc<dyn CacheListener>) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, listener));
        id
    }

    /// Returns whether a listener was registered under `id`.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(registered, _)| *registered != id);
        listeners.len() != before
    }

    fn notify(&self, event: impl Fn(&dyn CacheListener)) {
        // Listeners run outside the lock so they may touch the cache.
        let listeners: Vec<_> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            event(listener.as_ref());
        }
    }
}

impl std::fmt::Debug for AnalysisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisCache")
            .field("entries", &self.len())
            .field("hits", &self.cache_hits())
            .field("misses", &self.cache_misses())
            .field("listeners", &self.listeners.read().len())
            .finish()
    }
}
