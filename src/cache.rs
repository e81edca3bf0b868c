// TTL cache for the read-only reference sets (rooms, services). Entries are
// dropped lazily on read; the store rejects new entries once full.

use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub default_ttl: Duration,
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(300),
            capacity: 1024,
        }
    }
}

#[derive(Debug, Default)]
struct CacheStats {
    hit_count: AtomicUsize,
    miss_count: AtomicUsize,
    expired_count: AtomicUsize,
    rejected_count: AtomicUsize,
    insert_count: AtomicUsize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStatsReport {
    pub items_count: usize,
    pub hit_count: usize,
    pub miss_count: usize,
    pub expired_count: usize,
    pub rejected_count: usize,
    pub insert_count: usize,
}

struct CacheEntry {
    value: Value,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.stored_at.elapsed() > self.ttl
    }
}

pub struct ReferenceCache {
    entries: DashMap<String, CacheEntry>,
    config: RwLock<CacheConfig>,
    stats: CacheStats,
}

impl ReferenceCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config: RwLock::new(config),
            stats: CacheStats::default(),
        }
    }

    /// Store a value under the given key. Returns false if the cache is full
    /// even after purging expired entries.
    pub fn store(&self, key: &str, value: Value, ttl: Option<Duration>) -> bool {
        let config = self.config.read().clone();
        let ttl = ttl.unwrap_or(config.default_ttl);

        if !self.entries.contains_key(key) && self.entries.len() >= config.capacity {
            self.purge_expired();
            if self.entries.len() >= config.capacity {
                self.stats.rejected_count.fetch_add(1, Ordering::SeqCst);
                return false;
            }
        }

        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                stored_at: Instant::now(),
                ttl,
            },
        );
        self.stats.insert_count.fetch_add(1, Ordering::SeqCst);
        true
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        if let Some(entry) = self.entries.get(key) {
            if entry.is_expired() {
                drop(entry);
                self.entries.remove(key);
                self.stats.expired_count.fetch_add(1, Ordering::SeqCst);
                self.stats.miss_count.fetch_add(1, Ordering::SeqCst);
                return None;
            }

            self.stats.hit_count.fetch_add(1, Ordering::SeqCst);
            return Some(entry.value.clone());
        }

        self.stats.miss_count.fetch_add(1, Ordering::SeqCst);
        None
    }

    /// Drop every entry whose key starts with the prefix; returns the count.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for key in keys {
            if self.entries.remove(&key).is_some() {
                removed += 1;
            }
        }
        removed
    }

    pub fn set_default_ttl(&self, ttl: Duration) {
        self.config.write().default_ttl = ttl;
    }

    pub fn stats(&self) -> CacheStatsReport {
        CacheStatsReport {
            items_count: self.entries.len(),
            hit_count: self.stats.hit_count.load(Ordering::SeqCst),
            miss_count: self.stats.miss_count.load(Ordering::SeqCst),
            expired_count: self.stats.expired_count.load(Ordering::SeqCst),
            rejected_count: self.stats.rejected_count.load(Ordering::SeqCst),
            insert_count: self.stats.insert_count.load(Ordering::SeqCst),
        }
    }

    fn purge_expired(&self) {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.is_expired())
            .map(|entry| entry.key().clone())
            .collect();

        for key in expired {
            if self.entries.remove(&key).is_some() {
                self.stats.expired_count.fetch_add(1, Ordering::SeqCst);
            }
        }
    }
}
