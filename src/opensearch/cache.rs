//! TTL cache for discovery results.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use super::OpenSearchResult;
use crate::config::CacheConfig;

#[derive(Clone)]
struct CacheEntry {
    result: OpenSearchResult,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Thread-safe cache of successful discoveries keyed by seed URL.
pub struct DiscoveryCache {
    config: CacheConfig,
    entries: DashMap<String, CacheEntry>,
}

impl DiscoveryCache {
    /// Create a cache with the given configuration.
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: DashMap::new(),
        }
    }

    /// Cached result for `seed`, dropping it if expired.
    #[must_use]
    pub fn get(&self, seed: &str) -> Option<OpenSearchResult> {
        if !self.config.enabled {
            return None;
        }

        let entry = self.entries.get(seed)?;
        if entry.is_expired() {
            drop(entry);
            self.entries.remove(seed);
            return None;
        }
        Some(entry.result.clone())
    }

    /// Store a result; results without a URL are not cached.
    pub fn insert(&self, seed: &str, result: &OpenSearchResult) {
        if !self.config.enabled || result.url.is_none() {
            return;
        }

        self.enforce_max_entries();

        let ttl = Duration::from_secs(self.config.ttl_seconds);
        self.entries.insert(
            seed.to_string(),
            CacheEntry {
                result: result.clone(),
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Number of entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    fn cleanup_expired(&self) {
        self.entries.retain(|_, entry| !entry.is_expired());
    }

    fn enforce_max_entries(&self) {
        if self.entries.len() < self.config.max_entries {
            return;
        }
        self.cleanup_expired();

        if self.entries.len() >= self.config.max_entries {
            let to_remove = self.entries.len() - self.config.max_entries + 1;
            let keys: Vec<String> = self
                .entries
                .iter()
                .take(to_remove)
                .map(|entry| entry.key().clone())
                .collect();
            for key in keys {
                self.entries.remove(&key);
            }
        }
    }
}
