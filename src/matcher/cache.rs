//! Optional cache of resolved matches.
//!
//! Keyed by the normalized listing text; entries carry the reference
//! snapshot version they were computed against and are dropped when the
//! version moves on. Purely a latency layer, correctness never depends
//! on it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use super::MatchResult;

#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

struct CacheEntry {
    version: u64,
    result: MatchResult,
}

pub struct MatchCache {
    max_entries: usize,
    inner: Mutex<HashMap<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MatchCache {
    pub fn new(max_entries: usize) -> Self {
        MatchCache {
            max_entries,
            inner: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &str, version: u64) -> Option<MatchResult> {
        let mut map = self.inner.lock().expect("match cache lock poisoned");
        match map.get(key) {
            Some(entry) if entry.version == version => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.result.clone())
            }
            Some(_) => {
                // Stale snapshot, the entry is useless now.
                map.remove(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn put(&self, key: String, version: u64, result: MatchResult) {
        let mut map = self.inner.lock().expect("match cache lock poisoned");
        if map.len() >= self.max_entries {
            // Cheap full reset rather than an eviction policy, the cache
            // refills in a handful of requests.
            map.clear();
        }
        map.insert(key, CacheEntry { version, result });
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.inner.lock().expect("match cache lock poisoned").len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::NoMatchReason;

    fn no_match() -> MatchResult {
        MatchResult::NoMatch { reason: NoMatchReason::NoCandidates }
    }

    #[test]
    fn hit_and_miss_accounting() {
        let cache = MatchCache::new(16);
        assert!(cache.get("clio", 1).is_none());
        cache.put("clio".to_string(), 1, no_match());
        assert!(cache.get("clio", 1).is_some());

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn snapshot_refresh_invalidates() {
        let cache = MatchCache::new(16);
        cache.put("clio".to_string(), 1, no_match());
        // Version moved on: the entry is dropped, not served.
        assert!(cache.get("clio", 2).is_none());
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn full_cache_resets() {
        let cache = MatchCache::new(2);
        cache.put("a".to_string(), 1, no_match());
        cache.put("b".to_string(), 1, no_match());
        cache.put("c".to_string(), 1, no_match());
        assert_eq!(cache.stats().entries, 1);
    }
}
