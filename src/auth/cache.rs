//! Bounded, expiring cache of derived password hashes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Default time-to-live of a cached hash.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

/// Default maximum number of cached hashes.
pub const DEFAULT_CAPACITY: usize = 1000;

#[derive(Debug, Clone)]
struct CachedHash {
    hash: Arc<[u8]>,
    inserted_at: Instant,
}

/// A thread-safe cache of derived hashes keyed by (password, salt, iterations).
///
/// Entries expire a fixed time after insertion. When the cache is full,
/// expired entries are purged first, then the oldest entry is evicted.
#[derive(Debug)]
pub struct HashCache {
    inner: DashMap<String, CachedHash>,
    ttl: Duration,
    capacity: usize,
}

impl Default for HashCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_CAPACITY)
    }
}

impl HashCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            inner: DashMap::new(),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Build the cache key. `:` never occurs in base64, so keys are unambiguous.
    pub fn key(base64_password: &str, base64_salt: &str, iterations: u32) -> String {
        format!("{}:{}:{}", base64_password, base64_salt, iterations)
    }

    /// Get a cached hash that has not expired yet.
    pub fn get(&self, key: &str) -> Option<Arc<[u8]>> {
        let hit = self.inner.get(key).map(|entry| entry.value().clone())?;
        if hit.inserted_at.elapsed() < self.ttl {
            return Some(hit.hash);
        }

        self.inner
            .remove_if(key, |_, entry| entry.inserted_at.elapsed() >= self.ttl);
        None
    }

    pub fn insert(&self, key: String, hash: Arc<[u8]>) {
        if !self.inner.contains_key(&key) && self.inner.len() >= self.capacity {
            self.make_room();
        }

        self.inner.insert(
            key,
            CachedHash {
                hash,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Number of entries, including expired ones not purged yet.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn make_room(&self) {
        let ttl = self.ttl;
        self.inner.retain(|_, entry| entry.inserted_at.elapsed() < ttl);

        while self.inner.len() >= self.capacity {
            let oldest = self
                .inner
                .iter()
                .min_by_key(|entry| entry.value().inserted_at)
                .map(|entry| entry.key().clone());
            match oldest {
                Some(key) => {
                    self.inner.remove(&key);
                }
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(byte: u8) -> Arc<[u8]> {
        Arc::from(vec![byte; 4])
    }

    #[test]
    fn test_cache_operations() {
        let cache = HashCache::default();
        let key = HashCache::key("cGFzczE=", "c2FsdA==", 100);

        assert!(cache.get(&key).is_none());
        cache.insert(key.clone(), hash(1));
        assert_eq!(cache.get(&key).as_deref(), Some(&[1u8, 1, 1, 1][..]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_key_is_unambiguous() {
        assert_ne!(HashCache::key("ab", "c", 1), HashCache::key("a", "bc", 1));
        assert_ne!(HashCache::key("a", "b", 11), HashCache::key("a", "b1", 1));
    }

    #[test]
    fn test_entries_expire() {
        let cache = HashCache::new(Duration::from_millis(20), 10);
        cache.insert("k".into(), hash(1));
        assert!(cache.get("k").is_some());

        std::thread::sleep(Duration::from_millis(40));
        assert!(cache.get("k").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_is_bounded() {
        let cache = HashCache::new(Duration::from_secs(60), 3);
        for i in 0..10u8 {
            cache.insert(format!("k{}", i), hash(i));
            std::thread::sleep(Duration::from_millis(2));
        }

        assert_eq!(cache.len(), 3);
        // the newest entries survive
        assert!(cache.get("k9").is_some());
        assert!(cache.get("k8").is_some());
        assert!(cache.get("k0").is_none());
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let cache = HashCache::new(Duration::from_secs(60), 2);
        cache.insert("a".into(), hash(1));
        cache.insert("b".into(), hash(2));
        cache.insert("b".into(), hash(3));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_some());
        assert_eq!(cache.get("b").as_deref(), Some(&[3u8, 3, 3, 3][..]));
    }
}
