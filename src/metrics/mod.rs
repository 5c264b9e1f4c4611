//! Cache Metrics System
//!
//! Provides counters for the cache policies using BTreeMap-based metrics
//! reporting. Each policy tracks its own specific metrics while implementing
//! the common [`CacheMetrics`] trait.
//!
//! # Why BTreeMap over HashMap?
//!
//! Metrics always come out in the same key order, so two simulation runs can
//! be diffed line by line and test assertions do not depend on hash seeds.
//! With a couple of dozen keys the lookup cost is irrelevant.
//!
//! # What is counted where
//!
//! Request-level counters (`requests`, `cache_hits`, `expired`) are only
//! updated by `get`, which is the operation a workload replays. `check`,
//! `insert` and `evict` called directly leave them untouched, so peeking at
//! a cache never skews its hit rate. Structural counters (`insertions`,
//! `evictions`) are updated whenever an object enters or leaves the cache.

use std::collections::BTreeMap;

pub mod lru;
pub mod slru;

pub use lru::LruCacheMetrics;
pub use slru::SlruCacheMetrics;

/// Common metrics tracked by all cache policies
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CoreCacheMetrics {
    /// Total number of requests (gets) made to the cache
    pub requests: u64,

    /// Number of requests that resulted in cache hits
    pub cache_hits: u64,

    /// Number of requests that found the object expired
    ///
    /// Expired lookups are misses as well; this counts the subset.
    pub expired: u64,

    /// Total bytes of data requested from the cache (hits + misses)
    pub total_bytes_requested: u64,

    /// Total bytes served directly from cache (cache hits only)
    pub bytes_served_from_cache: u64,

    /// Total bytes written into the cache by insertions
    pub bytes_written_to_cache: u64,

    /// Number of objects admitted into the cache
    pub insertions: u64,

    /// Number of objects that left the cache to make room
    pub evictions: u64,

    /// Capacity in bytes
    pub max_cache_size_bytes: u64,
}

impl CoreCacheMetrics {
    /// Creates metrics for a cache of `max_cache_size_bytes` bytes.
    pub fn new(max_cache_size_bytes: u64) -> Self {
        Self {
            max_cache_size_bytes,
            ..Default::default()
        }
    }

    /// Records a request served from the cache.
    pub fn record_hit(&mut self, object_size: u64) {
        self.requests += 1;
        self.cache_hits += 1;
        self.total_bytes_requested += object_size;
        self.bytes_served_from_cache += object_size;
    }

    /// Records a request for an object that is not cached.
    pub fn record_miss(&mut self, object_size: u64) {
        self.requests += 1;
        self.total_bytes_requested += object_size;
    }

    /// Records a request for an object whose lifetime has passed.
    pub fn record_expired(&mut self, object_size: u64) {
        self.record_miss(object_size);
        self.expired += 1;
    }

    /// Records an object admitted into the cache.
    pub fn record_insertion(&mut self, object_size: u64) {
        self.insertions += 1;
        self.bytes_written_to_cache += object_size;
    }

    /// Records an object leaving the cache to make room.
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// Returns the number of requests that were not hits.
    pub fn cache_misses(&self) -> u64 {
        self.requests - self.cache_hits
    }

    /// Hit ratio in `[0.0, 1.0]`, or 0.0 before the first request.
    pub fn hit_rate(&self) -> f64 {
        if self.requests > 0 {
            self.cache_hits as f64 / self.requests as f64
        } else {
            0.0
        }
    }

    /// Miss ratio in `[0.0, 1.0]`, or 0.0 before the first request.
    pub fn miss_rate(&self) -> f64 {
        if self.requests > 0 {
            self.cache_misses() as f64 / self.requests as f64
        } else {
            0.0
        }
    }

    /// Ratio of bytes served from cache to bytes requested.
    pub fn byte_hit_rate(&self) -> f64 {
        if self.total_bytes_requested > 0 {
            self.bytes_served_from_cache as f64 / self.total_bytes_requested as f64
        } else {
            0.0
        }
    }

    /// Convert core metrics to BTreeMap for reporting
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();

        metrics.insert("cache_hits".to_string(), self.cache_hits as f64);
        metrics.insert("cache_misses".to_string(), self.cache_misses() as f64);
        metrics.insert("evictions".to_string(), self.evictions as f64);
        metrics.insert("expired".to_string(), self.expired as f64);
        metrics.insert("insertions".to_string(), self.insertions as f64);
        metrics.insert("requests".to_string(), self.requests as f64);

        // Rates (0.0 to 1.0)
        metrics.insert("hit_rate".to_string(), self.hit_rate());
        metrics.insert("miss_rate".to_string(), self.miss_rate());
        metrics.insert("byte_hit_rate".to_string(), self.byte_hit_rate());

        // Bytes
        metrics.insert(
            "bytes_served_from_cache".to_string(),
            self.bytes_served_from_cache as f64,
        );
        metrics.insert(
            "bytes_written_to_cache".to_string(),
            self.bytes_written_to_cache as f64,
        );
        metrics.insert(
            "total_bytes_requested".to_string(),
            self.total_bytes_requested as f64,
        );
        metrics.insert(
            "max_cache_size_bytes".to_string(),
            self.max_cache_size_bytes as f64,
        );

        if self.requests > 0 {
            metrics.insert(
                "avg_object_size".to_string(),
                self.total_bytes_requested as f64 / self.requests as f64,
            );
            metrics.insert(
                "eviction_rate".to_string(),
                self.evictions as f64 / self.requests as f64,
            );
        }

        metrics
    }
}

/// Trait that all cache policies implement for metrics reporting
///
/// Lets a simulation collect and compare metrics across policies without
/// knowing their concrete types.
pub trait CacheMetrics {
    /// Returns all metrics as key-value pairs in deterministic order.
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// Algorithm name for identification (e.g. "LRU", "SLRU").
    fn algorithm_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates_before_any_request() {
        let metrics = CoreCacheMetrics::new(100);
        assert_eq!(metrics.hit_rate(), 0.0);
        assert_eq!(metrics.miss_rate(), 0.0);
        assert_eq!(metrics.byte_hit_rate(), 0.0);
        assert!(!metrics.to_btreemap().contains_key("avg_object_size"));
    }

    #[test]
    fn test_expired_counts_as_miss() {
        let mut metrics = CoreCacheMetrics::new(100);
        metrics.record_hit(10);
        metrics.record_expired(30);
        metrics.record_miss(60);

        assert_eq!(metrics.requests, 3);
        assert_eq!(metrics.cache_misses(), 2);
        assert_eq!(metrics.expired, 1);
        assert!((metrics.byte_hit_rate() - 0.1).abs() < f64::EPSILON);

        let map = metrics.to_btreemap();
        assert_eq!(map["cache_hits"], 1.0);
        assert_eq!(map["expired"], 1.0);
        assert_eq!(map["total_bytes_requested"], 100.0);
    }

    #[test]
    fn test_btreemap_keys_are_sorted() {
        let mut metrics = CoreCacheMetrics::new(100);
        metrics.record_miss(1);
        let keys: Vec<_> = metrics.to_btreemap().into_keys().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }
}
