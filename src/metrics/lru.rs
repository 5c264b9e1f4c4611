//! LRU Cache Metrics
//!
//! Metrics specific to the LRU (Least Recently Used) cache policy.

use super::{CacheMetrics, CoreCacheMetrics};
use std::collections::BTreeMap;

/// LRU-specific metrics (extends CoreCacheMetrics)
#[derive(Debug, Clone, PartialEq)]
pub struct LruCacheMetrics {
    /// Core metrics common to all cache policies
    pub core: CoreCacheMetrics,

    /// Number of objects explicitly removed by id
    pub removals: u64,

    /// Number of expired objects dropped when a lookup found them
    pub expired_removals: u64,
}

impl LruCacheMetrics {
    /// Creates metrics for an LRU of `max_cache_size_bytes` bytes.
    pub fn new(max_cache_size_bytes: u64) -> Self {
        Self {
            core: CoreCacheMetrics::new(max_cache_size_bytes),
            removals: 0,
            expired_removals: 0,
        }
    }

    /// Records an explicit removal.
    pub fn record_removal(&mut self) {
        self.removals += 1;
    }

    /// Records an expired object dropped by a lookup.
    pub fn record_expired_removal(&mut self) {
        self.expired_removals += 1;
    }

    /// Converts LRU metrics to a BTreeMap for reporting
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = self.core.to_btreemap();
        metrics.insert("removals".to_string(), self.removals as f64);
        metrics.insert(
            "expired_removals".to_string(),
            self.expired_removals as f64,
        );
        metrics
    }
}

impl CacheMetrics for LruCacheMetrics {
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.to_btreemap()
    }

    fn algorithm_name(&self) -> &'static str {
        "LRU"
    }
}
