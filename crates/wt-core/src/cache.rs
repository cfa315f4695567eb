//! Bounded, time-expiring cache of domain classifications.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::domain::Domain;
use crate::types::Category;

/// How long a cached classification stays fresh.
pub const CACHE_TTL: Duration = Duration::hours(24);

/// Maximum number of cached domains.
pub const CACHE_CAPACITY: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheEntry {
    category: Category,
    cached_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.cached_at <= ttl
    }
}

/// Domain → category cache with TTL expiry and a hard size cap.
///
/// Cleanup runs synchronously inside every insert, so the cap holds before
/// the next lookup.
#[derive(Debug, Clone)]
pub struct ClassificationCache {
    entries: HashMap<Domain, CacheEntry>,
    ttl: Duration,
    capacity: usize,
}

impl Default for ClassificationCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassificationCache {
    /// Creates a cache with the standard TTL and capacity.
    pub fn new() -> Self {
        Self::with_limits(CACHE_TTL, CACHE_CAPACITY)
    }

    pub fn with_limits(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            capacity,
        }
    }

    /// Returns the cached category if present and still fresh.
    pub fn lookup(&self, domain: &Domain) -> Option<&Category> {
        self.lookup_at(domain, Utc::now())
    }

    pub fn lookup_at(&self, domain: &Domain, now: DateTime<Utc>) -> Option<&Category> {
        self.entries
            .get(domain)
            .filter(|entry| entry.is_fresh(now, self.ttl))
            .map(|entry| &entry.category)
    }

    /// Stores a classification stamped with the current time.
    pub fn insert(&mut self, domain: Domain, category: Category) {
        self.insert_at(domain, category, Utc::now());
    }

    pub fn insert_at(&mut self, domain: Domain, category: Category, now: DateTime<Utc>) {
        self.entries.insert(
            domain,
            CacheEntry {
                category,
                cached_at: now,
            },
        );
        self.cleanup(now);
    }

    /// Drops every cached classification.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes expired entries, then the oldest entries until at capacity.
    fn cleanup(&mut self, now: DateTime<Utc>) {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh(now, ttl));
        let expired = before - self.entries.len();

        let mut evicted = 0;
        if self.entries.len() > self.capacity {
            let mut by_age: Vec<(DateTime<Utc>, Domain)> = self
                .entries
                .iter()
                .map(|(domain, entry)| (entry.cached_at, domain.clone()))
                .collect();
            by_age.sort();
            let excess = self.entries.len() - self.capacity;
            for (_, domain) in by_age.into_iter().take(excess) {
                self.entries.remove(&domain);
                evicted += 1;
            }
        }

        if expired > 0 || evicted > 0 {
            tracing::debug!(expired, evicted, size = self.entries.len(), "cleaned classification cache");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain(host: &str) -> Domain {
        Domain::normalize(host).unwrap()
    }

    fn category(name: &str) -> Category {
        Category::new(name).unwrap()
    }

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn lookup_returns_fresh_entry() {
        let mut cache = ClassificationCache::new();
        let now = at("2025-01-01T00:00:00Z");
        cache.insert_at(domain("github.com"), category("Work"), now);

        let hit = cache.lookup_at(&domain("github.com"), now + Duration::hours(1));
        assert_eq!(hit, Some(&category("Work")));
    }

    #[test]
    fn entry_exactly_at_ttl_is_still_fresh() {
        let mut cache = ClassificationCache::new();
        let now = at("2025-01-01T00:00:00Z");
        cache.insert_at(domain("github.com"), category("Work"), now);

        assert!(cache.lookup_at(&domain("github.com"), now + CACHE_TTL).is_some());
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let mut cache = ClassificationCache::new();
        let now = at("2025-01-01T00:00:00Z");
        cache.insert_at(domain("github.com"), category("Work"), now);

        let later = now + CACHE_TTL + Duration::milliseconds(1);
        assert!(cache.lookup_at(&domain("github.com"), later).is_none());
    }

    #[test]
    fn insert_purges_expired_entries() {
        let mut cache = ClassificationCache::new();
        let start = at("2025-01-01T00:00:00Z");
        cache.insert_at(domain("old.example"), category("Work"), start);

        let later = start + Duration::hours(25);
        cache.insert_at(domain("new.example"), category("Social"), later);

        assert_eq!(cache.len(), 1);
        assert!(cache.lookup_at(&domain("new.example"), later).is_some());
    }

    #[test]
    fn size_never_exceeds_capacity() {
        let mut cache = ClassificationCache::new();
        let start = at("2025-01-01T00:00:00Z");
        for i in 0..1500 {
            let now = start + Duration::seconds(i);
            cache.insert_at(domain(&format!("site{i}.example")), category("Work"), now);
            assert!(cache.len() <= CACHE_CAPACITY);
        }
        assert_eq!(cache.len(), CACHE_CAPACITY);
    }

    #[test]
    fn overflow_evicts_oldest_first() {
        let mut cache = ClassificationCache::with_limits(CACHE_TTL, 2);
        let start = at("2025-01-01T00:00:00Z");
        cache.insert_at(domain("a.example"), category("A"), start);
        cache.insert_at(domain("b.example"), category("B"), start + Duration::seconds(1));
        cache.insert_at(domain("c.example"), category("C"), start + Duration::seconds(2));

        let now = start + Duration::seconds(3);
        assert!(cache.lookup_at(&domain("a.example"), now).is_none());
        assert!(cache.lookup_at(&domain("b.example"), now).is_some());
        assert!(cache.lookup_at(&domain("c.example"), now).is_some());
    }

    #[test]
    fn reinsert_refreshes_timestamp() {
        let mut cache = ClassificationCache::with_limits(CACHE_TTL, 2);
        let start = at("2025-01-01T00:00:00Z");
        cache.insert_at(domain("a.example"), category("A"), start);
        cache.insert_at(domain("b.example"), category("B"), start + Duration::seconds(1));
        cache.insert_at(domain("a.example"), category("A"), start + Duration::seconds(2));
        cache.insert_at(domain("c.example"), category("C"), start + Duration::seconds(3));

        let now = start + Duration::seconds(4);
        assert!(cache.lookup_at(&domain("a.example"), now).is_some());
        assert!(cache.lookup_at(&domain("b.example"), now).is_none());
    }

    #[test]
    fn clear_empties_cache() {
        let mut cache = ClassificationCache::new();
        cache.insert(domain("github.com"), category("Work"));
        assert!(!cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.lookup(&domain("github.com")).is_none());
    }
}
