//! SLRU Cache Metrics
//!
//! Metrics specific to the SLRU (Segmented Least Recently Used) cache policy.

use super::{CacheMetrics, CoreCacheMetrics};
use std::collections::BTreeMap;

/// SLRU-specific metrics (extends CoreCacheMetrics)
///
/// SLRU moves objects between segments, so on top of the core counters these
/// metrics track where hits land and how objects travel between segments.
#[derive(Debug, Clone, PartialEq)]
pub struct SlruCacheMetrics {
    /// Core metrics common to all cache policies
    pub core: CoreCacheMetrics,

    /// Hits per segment, segment 0 first
    pub segment_hits: Vec<u64>,

    /// Objects moved one segment up after a hit
    pub promotions: u64,

    /// Objects pushed one segment down by cooling
    pub demotions: u64,

    /// Demoted objects dropped because the lower segment could not make room
    pub cooling_drops: u64,

    /// Objects explicitly removed by id
    pub removals: u64,
}

impl SlruCacheMetrics {
    /// Creates metrics for an SLRU of `n_seg` segments and
    /// `max_cache_size_bytes` bytes in total.
    pub fn new(max_cache_size_bytes: u64, n_seg: usize) -> Self {
        Self {
            core: CoreCacheMetrics::new(max_cache_size_bytes),
            segment_hits: vec![0; n_seg],
            promotions: 0,
            demotions: 0,
            cooling_drops: 0,
            removals: 0,
        }
    }

    /// Records a hit found in `segment`.
    pub fn record_segment_hit(&mut self, segment: usize, object_size: u64) {
        self.core.record_hit(object_size);
        if let Some(hits) = self.segment_hits.get_mut(segment) {
            *hits += 1;
        }
    }

    /// Records a promotion into a higher segment.
    pub fn record_promotion(&mut self) {
        self.promotions += 1;
    }

    /// Records a demotion into a lower segment.
    pub fn record_demotion(&mut self) {
        self.demotions += 1;
    }

    /// Records a demoted object that had to leave the cache instead.
    pub fn record_cooling_drop(&mut self) {
        self.cooling_drops += 1;
        self.core.record_eviction();
    }

    /// Records an explicit removal.
    pub fn record_removal(&mut self) {
        self.removals += 1;
    }

    /// Share of hits served by the top segment, or 0.0 without hits.
    pub fn protection_ratio(&self) -> f64 {
        match self.segment_hits.last() {
            Some(&top) if self.core.cache_hits > 0 => top as f64 / self.core.cache_hits as f64,
            _ => 0.0,
        }
    }

    /// Converts SLRU metrics to a BTreeMap for reporting
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = self.core.to_btreemap();

        for (segment, hits) in self.segment_hits.iter().enumerate() {
            metrics.insert(format!("segment_{segment}_hits"), *hits as f64);
        }
        metrics.insert("protection_ratio".to_string(), self.protection_ratio());

        // Movement metrics
        metrics.insert("promotions".to_string(), self.promotions as f64);
        metrics.insert("demotions".to_string(), self.demotions as f64);
        metrics.insert("cooling_drops".to_string(), self.cooling_drops as f64);
        metrics.insert("removals".to_string(), self.removals as f64);

        if self.core.requests > 0 {
            metrics.insert(
                "promotion_rate".to_string(),
                self.promotions as f64 / self.core.requests as f64,
            );
            metrics.insert(
                "demotion_rate".to_string(),
                self.demotions as f64 / self.core.requests as f64,
            );
        }

        metrics
    }
}

impl CacheMetrics for SlruCacheMetrics {
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.to_btreemap()
    }

    fn algorithm_name(&self) -> &'static str {
        "SLRU"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_hits_feed_core_hits() {
        let mut metrics = SlruCacheMetrics::new(100, 3);
        metrics.record_segment_hit(0, 5);
        metrics.record_segment_hit(2, 5);
        metrics.record_segment_hit(2, 5);

        assert_eq!(metrics.core.cache_hits, 3);
        assert_eq!(metrics.segment_hits, vec![1, 0, 2]);
        assert!((metrics.protection_ratio() - 2.0 / 3.0).abs() < 1e-9);

        let map = metrics.to_btreemap();
        assert_eq!(map["segment_2_hits"], 2.0);
        assert_eq!(map["segment_1_hits"], 0.0);
    }

    #[test]
    fn test_cooling_drop_is_an_eviction() {
        let mut metrics = SlruCacheMetrics::new(100, 2);
        metrics.record_cooling_drop();
        assert_eq!(metrics.cooling_drops, 1);
        assert_eq!(metrics.core.evictions, 1);
    }
}
