// src/cache.rs
// Process-local response cache with per-entry TTL and FIFO eviction.
// Eviction is insertion-order, not access-order: recency tracking was
// judged not worth the bookkeeping for short-TTL response bodies. Hits
// are instance-local only; staleness is bounded by the entry TTL.

use axum::body::Bytes;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct CacheEntry {
    body: Bytes,
    expires_at: Instant,
}

struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    // Insertion order of keys. May contain keys already dropped from
    // `entries` by expiry; eviction skips those.
    order: VecDeque<String>,
}

pub struct ResponseCache {
    inner: Mutex<CacheInner>,
    max_size: usize,
    default_ttl: Duration,
}

impl ResponseCache {
    pub fn new(max_size: usize, default_ttl: Duration) -> Self {
        ResponseCache {
            inner: Mutex::new(CacheInner {
                entries: HashMap::with_capacity(max_size.min(1024)),
                order: VecDeque::new(),
            }),
            max_size,
            default_ttl,
        }
    }

    /// Look up a cached body. Expired entries count as absent and are
    /// dropped on the spot.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        let mut inner = self.inner.lock().unwrap();
        match inner.entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.body.clone()),
            Some(_) => {
                inner.entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Insert a body under `key`. At capacity the oldest-inserted live
    /// entry is evicted first. Re-inserting an existing key replaces the
    /// value but keeps the key's original position in the eviction order.
    pub fn put(&self, key: &str, body: Bytes, ttl: Option<Duration>) {
        let expires_at = Instant::now() + ttl.unwrap_or(self.default_ttl);
        let mut inner = self.inner.lock().unwrap();

        if let Some(entry) = inner.entries.get_mut(key) {
            entry.body = body;
            entry.expires_at = expires_at;
            return;
        }

        if inner.entries.len() >= self.max_size {
            while let Some(oldest) = inner.order.pop_front() {
                if inner.entries.remove(&oldest).is_some() {
                    break;
                }
            }
        }

        inner.order.push_back(key.to_string());
        inner.entries.insert(key.to_string(), CacheEntry { body, expires_at });
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.entries.clear();
        inner.order.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(s: &str) -> Bytes {
        Bytes::copy_from_slice(s.as_bytes())
    }

    #[test]
    fn test_get_put_round_trip() {
        let cache = ResponseCache::new(4, Duration::from_secs(60));
        assert!(cache.get("/api/batches").is_none());

        cache.put("/api/batches", body("[1,2]"), None);
        assert_eq!(cache.get("/api/batches"), Some(body("[1,2]")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_capacity_evicts_first_inserted() {
        let cache = ResponseCache::new(3, Duration::from_secs(60));
        cache.put("a", body("1"), None);
        cache.put("b", body("2"), None);
        cache.put("c", body("3"), None);
        cache.put("d", body("4"), None);

        assert_eq!(cache.len(), 3);
        assert!(cache.get("a").is_none());
        assert_eq!(cache.get("b"), Some(body("2")));
        assert_eq!(cache.get("c"), Some(body("3")));
        assert_eq!(cache.get("d"), Some(body("4")));
    }

    #[test]
    fn test_eviction_ignores_access_recency() {
        let cache = ResponseCache::new(2, Duration::from_secs(60));
        cache.put("a", body("1"), None);
        cache.put("b", body("2"), None);

        // Touching "a" does not protect it: eviction is FIFO.
        assert!(cache.get("a").is_some());
        cache.put("c", body("3"), None);

        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_replacing_key_keeps_size() {
        let cache = ResponseCache::new(2, Duration::from_secs(60));
        cache.put("a", body("1"), None);
        cache.put("a", body("2"), None);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a"), Some(body("2")));
    }

    #[test]
    fn test_expired_entry_is_absent_and_removed() {
        let cache = ResponseCache::new(4, Duration::from_secs(60));
        cache.put("a", body("1"), Some(Duration::from_millis(10)));
        assert_eq!(cache.len(), 1);

        std::thread::sleep(Duration::from_millis(20));
        assert!(cache.get("a").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_expired_slot_does_not_block_new_inserts() {
        let cache = ResponseCache::new(2, Duration::from_secs(60));
        cache.put("a", body("1"), Some(Duration::from_millis(10)));
        cache.put("b", body("2"), None);

        std::thread::sleep(Duration::from_millis(20));
        assert!(cache.get("a").is_none());

        // "a" left a stale key in the order queue; eviction must skip it
        // and still make room correctly.
        cache.put("c", body("3"), None);
        cache.put("d", body("4"), None);
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
        assert!(cache.get("d").is_some());
    }

    #[test]
    fn test_clear_drops_everything() {
        let cache = ResponseCache::new(4, Duration::from_secs(60));
        cache.put("a", body("1"), None);
        cache.put("b", body("2"), None);
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get("a").is_none());
    }
}
