//! In-process cache of aggregated network usage, keyed by date range

use dashmap::DashMap;
use netstat_core::{config::CacheConfig, types::UsageStats};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    stats: UsageStats,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Aggregation cache shared by every request handler
///
/// Entries stored without a lifetime never expire; they cover ranges that
/// can no longer receive uploads.
#[derive(Debug)]
pub struct UsageCache {
    entries: DashMap<String, CacheEntry>,
    enabled: bool,
    max_entries: usize,
}

impl UsageCache {
    /// Create a cache from configuration
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            enabled: config.enabled,
            max_entries: config.max_entries.max(1),
        }
    }

    /// Look up a range, dropping the entry if it has expired
    #[must_use]
    pub fn get(&self, key: &str) -> Option<UsageStats> {
        if !self.enabled {
            return None;
        }
        let now = Instant::now();
        let entry = *self.entries.get(key)?;
        if entry.is_expired(now) {
            self.entries.remove_if(key, |_, e| e.is_expired(now));
            return None;
        }
        Some(entry.stats)
    }

    /// Store a range; `ttl` of `None` keeps the entry forever
    pub fn insert(&self, key: String, stats: UsageStats, ttl: Option<Duration>) {
        if !self.enabled {
            return;
        }
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(&key) {
            self.evict();
        }
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.entries.insert(key, CacheEntry { stats, expires_at });
    }

    /// Number of live and expired entries currently held
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entry
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        if self.entries.len() < self.max_entries {
            return;
        }
        // Prefer dropping an entry that would expire anyway
        let victim = self
            .entries
            .iter()
            .filter(|e| e.value().expires_at.is_some())
            .min_by_key(|e| e.value().expires_at)
            .map(|e| e.key().clone())
            .or_else(|| self.entries.iter().next().map(|e| e.key().clone()));
        if let Some(key) = victim {
            self.entries.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netstat_core::types::GlobalUsage;
    use pretty_assertions::assert_eq;

    fn stats(users: i64) -> UsageStats {
        UsageStats {
            stats_global: GlobalUsage {
                users,
                ..GlobalUsage::default()
            },
            ..UsageStats::default()
        }
    }

    fn config(max_entries: usize) -> CacheConfig {
        CacheConfig {
            enabled: true,
            recent_ttl_seconds: 3600,
            max_entries,
        }
    }

    #[test]
    fn test_get_returns_inserted_value() {
        let cache = UsageCache::new(&config(8));
        cache.insert("20240101-20240107".to_string(), stats(42), None);

        assert_eq!(cache.get("20240101-20240107"), Some(stats(42)));
        assert_eq!(cache.get("20240102-20240108"), None);
    }

    #[test]
    fn test_expired_entry_is_dropped() {
        let cache = UsageCache::new(&config(8));
        cache.insert("k".to_string(), stats(1), Some(Duration::ZERO));

        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_disabled_cache_stores_nothing() {
        let cache = UsageCache::new(&CacheConfig {
            enabled: false,
            ..config(8)
        });
        cache.insert("k".to_string(), stats(1), None);

        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_is_bounded() {
        let cache = UsageCache::new(&config(2));
        cache.insert("a".to_string(), stats(1), None);
        cache.insert("b".to_string(), stats(2), Some(Duration::from_secs(60)));
        cache.insert("c".to_string(), stats(3), None);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some(stats(1)));
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("c"), Some(stats(3)));
    }
}
