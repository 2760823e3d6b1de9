//! High-Performance In-Memory Cache Module
//!
//! Thread-safe TTL cache used for read-through todo page caching.
//! Uses DashMap for concurrent access without lock contention.
//!
//! Features:
//! - TTL-based expiration (5 minutes default)
//! - Prefix invalidation for grouped keys
//! - Cache HIT/MISS logging and counters

use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Default TTL: 5 minutes
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Cache entry with creation time for TTL validation
#[derive(Clone, Debug)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: Instant,
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }

    /// Seconds left before expiry
    pub fn remaining_ttl(&self) -> u64 {
        self.ttl.saturating_sub(self.created_at.elapsed()).as_secs()
    }
}

/// Shared TTL cache keyed by string
#[derive(Clone)]
pub struct TtlCache<V> {
    store: Arc<DashMap<String, CacheEntry<V>>>,
    ttl: Duration,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            ttl,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns Some(value) on a live hit, None on miss or expiry
    pub fn get(&self, key: &str) -> Option<V> {
        if let Some(entry) = self.store.get(key) {
            if entry.is_expired() {
                drop(entry); // release read lock before removing
                self.remove_expired(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("CACHE MISS (expired): {}", key);
                None
            } else {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("CACHE HIT: {} (TTL: {}s remaining)", key, entry.remaining_ttl());
                Some(entry.value.clone())
            }
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!("CACHE MISS: {}", key);
            None
        }
    }

    pub fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        debug!("CACHE SET: {} (TTL: {}s)", key, self.ttl.as_secs());
        self.store.insert(
            key,
            CacheEntry {
                value,
                created_at: Instant::now(),
                ttl: self.ttl,
            },
        );
    }

    /// Remove `key` only if the stored entry is expired. An entry written
    /// again by another task in the meantime is left alone.
    fn remove_expired(&self, key: &str) -> bool {
        self.store.remove_if(key, |_, e| e.is_expired()).is_some()
    }

    pub fn invalidate(&self, key: &str) {
        self.store.remove(key);
    }

    /// Drop every entry whose key starts with `prefix`, returns how many went
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let before = self.store.len();
        self.store.retain(|key, _| !key.starts_with(prefix));
        let removed = before.saturating_sub(self.store.len());
        if removed > 0 {
            debug!("CACHE INVALIDATE PREFIX: {} ({} entries)", prefix, removed);
        }
        removed
    }

    pub fn cleanup_expired(&self) -> usize {
        let before = self.store.len();
        self.store.retain(|_, entry| !entry.is_expired());
        let removed = before.saturating_sub(self.store.len());
        if removed > 0 {
            info!("CACHE CLEANUP: {} expired entries removed", removed);
        }
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            entries: self.store.len(),
            hits,
            misses,
            hit_rate,
            ttl_secs: self.ttl.as_secs(),
        }
    }
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub ttl_secs: u64,
}
