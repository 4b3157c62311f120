//! Rendered page cache
//!
//! Published pages are reused for `revalidate_secs` after they are
//! rendered, so a burst of visitors costs one round of CMS queries. Preview
//! renders never go through the cache.

use dashmap::DashMap;
use std::time::{Duration, Instant};

/// A rendered page and when it stops being fresh
#[derive(Debug, Clone)]
struct CacheEntry {
    html: String,
    expires_at: Instant,
}

/// Time-bounded cache of rendered HTML, keyed by request path
#[derive(Debug)]
pub struct PageCache {
    ttl: Duration,
    entries: DashMap<String, CacheEntry>,
}

impl PageCache {
    /// A zero TTL disables the cache
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Cached HTML for `key` if it is still fresh
    pub fn get(&self, key: &str) -> Option<String> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<String> {
        let entry = self.entries.get(key)?;
        if now < entry.expires_at {
            tracing::debug!("Page cache hit: {}", key);
            return Some(entry.html.clone());
        }
        // Expired
        drop(entry);
        self.entries.remove(key);
        None
    }

    /// Store a freshly rendered page
    pub fn insert(&self, key: &str, html: String) {
        self.insert_at(key, html, Instant::now());
    }

    fn insert_at(&self, key: &str, html: String, now: Instant) {
        if !self.is_enabled() {
            return;
        }
        self.entries.retain(|_, entry| now < entry.expires_at);
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                html,
                expires_at: now + self.ttl,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_entries_are_returned() {
        let cache = PageCache::new(Duration::from_secs(60));
        cache.insert("/", "<html>home</html>".to_string());
        assert_eq!(cache.get("/").as_deref(), Some("<html>home</html>"));
        assert!(cache.get("/post/a").is_none());
    }

    #[test]
    fn test_entries_expire() {
        let cache = PageCache::new(Duration::from_secs(60));
        let start = Instant::now();
        cache.insert_at("/", "old".to_string(), start);
        cache.insert_at("/post/a", "old".to_string(), start);

        assert!(cache.get_at("/", start + Duration::from_secs(59)).is_some());
        assert!(cache.get_at("/", start + Duration::from_secs(60)).is_none());
        // Expired entries are dropped on read
        assert_eq!(cache.len(), 1);

        // ...and pruned on the next insert
        cache.insert_at("/post/b", "new".to_string(), start + Duration::from_secs(61));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_zero_ttl_disables_cache() {
        let cache = PageCache::new(Duration::ZERO);
        cache.insert("/", "page".to_string());
        assert!(cache.get("/").is_none());
        assert!(cache.is_empty());
    }
}
