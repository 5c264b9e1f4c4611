//! Least Recently Used (LRU) Cache Implementation
//!
//! This module provides the byte-bounded LRU cache that serves both as a
//! standalone policy and as the segment type of an [`SlruCache`](crate::SlruCache).
//!
//! # Algorithm
//!
//! Objects are kept in order of recency of use. A hit moves the object to the
//! most recently used end; admitting an object that does not fit evicts from
//! the least recently used end until it does.
//!
//! ```text
//!   MRU                                       LRU
//!   ┌─────┐   ┌─────┐   ┌─────┐   ┌─────┐
//!   │  D  │──▶│  C  │──▶│  B  │──▶│  A  │  ◀── evict()
//!   └─────┘   └─────┘   └─────┘   └─────┘
//!      ▲
//!      └── insert() / hit
//! ```
//!
//! # Data Structures
//!
//! - A [`ConcurrentIndex`] maps ids to objects. It is shared behind an `Arc`
//!   so other threads can look objects up while the owner mutates the cache.
//! - A recency list holds the structural reference to each object. The list
//!   slot is stored on the object, so hits and removals are O(1).
//!
//! # Performance Characteristics
//!
//! - get / check / insert / remove: O(1) expected (one hash chain walk)
//! - evict: O(1)
//!
//! # Thread Safety
//!
//! Mutating operations take `&mut self`. To share a cache between threads,
//! wrap it in a synchronization primitive such as `parking_lot::Mutex`.

use crate::cache::Cache;
use crate::concurrent::ConcurrentIndex;
use crate::config::CommonCacheParams;
use crate::error::CacheResult;
use crate::list::RecencyList;
use crate::metrics::{CacheMetrics, LruCacheMetrics};
use crate::object::{CacheObject, ObjId, ObjectRef};
use crate::request::{CheckResult, Request};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A byte-bounded LRU cache.
///
/// # Examples
///
/// ```
/// use simcache::config::CommonCacheParams;
/// use simcache::{Cache, CheckResult, LruCache, Request};
///
/// let mut cache = LruCache::init(CommonCacheParams::new(200).with_hashpower(8));
///
/// assert_eq!(cache.get(&Request::new(1, 100)), CheckResult::Miss);
/// assert_eq!(cache.get(&Request::new(2, 100)), CheckResult::Miss);
/// assert_eq!(cache.get(&Request::new(1, 100)), CheckResult::Hit);
///
/// // Object 2 is now least recently used and makes room for 3.
/// cache.get(&Request::new(3, 100));
/// assert!(cache.contains(1));
/// assert!(!cache.contains(2));
/// ```
pub struct LruCache {
    params: CommonCacheParams,
    index: Arc<ConcurrentIndex>,
    queue: RecencyList,
    occupied_size: u64,
    metrics: LruCacheMetrics,
}

impl LruCache {
    /// Creates an empty cache.
    pub fn try_init(params: CommonCacheParams) -> CacheResult<Self> {
        params.validate()?;
        let index = ConcurrentIndex::try_new(params.hashpower())?;
        Ok(Self::with_index(params, index))
    }

    /// Creates an empty cache.
    ///
    /// # Panics
    /// Panics if `params` is out of range. Failing to allocate the index
    /// terminates the process.
    pub fn init(params: CommonCacheParams) -> Self {
        if let Err(err) = params.validate() {
            panic!("{err}");
        }
        Self::with_index(params, ConcurrentIndex::new(params.hashpower()))
    }

    fn with_index(params: CommonCacheParams, index: ConcurrentIndex) -> Self {
        tracing::debug!(
            cache_size = params.cache_size(),
            per_obj_overhead = params.per_obj_overhead(),
            hashpower = params.hashpower(),
            "created LRU cache"
        );
        Self {
            params,
            index: Arc::new(index),
            queue: RecencyList::new(),
            occupied_size: 0,
            metrics: LruCacheMetrics::new(params.cache_size()),
        }
    }

    /// Returns the parameters the cache was built with.
    pub fn params(&self) -> &CommonCacheParams {
        &self.params
    }

    /// Returns a handle to the object index.
    pub fn index(&self) -> &Arc<ConcurrentIndex> {
        &self.index
    }

    /// Returns the counters collected so far.
    pub fn lru_metrics(&self) -> &LruCacheMetrics {
        &self.metrics
    }

    /// Iterates over cached objects from most to least recently used.
    pub fn iter(&self) -> impl Iterator<Item = &ObjectRef> + '_ {
        self.queue.iter()
    }

    /// Returns the most recently used object.
    pub fn front(&self) -> Option<&ObjectRef> {
        self.queue.front()
    }

    #[inline]
    fn charge(&self, obj_size: u64) -> u64 {
        obj_size.saturating_add(self.params.per_obj_overhead())
    }

    /// Looks `obj_id` up, ignoring objects that are indexed but not linked.
    fn lookup(&self, obj_id: ObjId) -> Option<ObjectRef> {
        self.index.find(obj_id).filter(|obj| obj.in_cache())
    }

    /// Unlinks `obj` from the queue and, if it is still the indexed entry for
    /// its id, from the index. Returns `None` if `obj` is not linked here.
    fn unlink(&mut self, obj: &CacheObject) -> Option<ObjectRef> {
        let slot = obj.slot().filter(|&slot| self.queue.holds(slot, obj))?;
        let removed = self.queue.remove(slot)?;
        removed.set_in_cache(false);
        self.index.delete_exact(&removed);
        self.occupied_size -= self.charge(removed.obj_size());
        Some(removed)
    }

    /// Unlinks queued objects whose index entry was replaced or deleted
    /// through the shared index handle.
    fn purge_orphans(&mut self) {
        let orphans: Vec<ObjectRef> = self
            .queue
            .iter()
            .filter(|obj| !obj.in_cache())
            .cloned()
            .collect();
        for obj in orphans {
            tracing::debug!(obj_id = obj.obj_id(), "dropping object unlinked from the index");
            self.unlink(&obj);
        }
    }
}

impl Cache for LruCache {
    fn name(&self) -> &'static str {
        "LRU"
    }

    fn get(&mut self, req: &Request) -> CheckResult {
        let result = self.check(req, true);
        match result {
            CheckResult::Hit => self.metrics.core.record_hit(req.obj_size),
            CheckResult::Miss => self.metrics.core.record_miss(req.obj_size),
            CheckResult::Expired => self.metrics.core.record_expired(req.obj_size),
        }

        if !result.is_hit() {
            if self.can_admit(req.obj_size) {
                self.insert(req);
            } else {
                tracing::trace!(
                    obj_id = req.obj_id,
                    obj_size = req.obj_size,
                    "object too large to cache"
                );
            }
        }
        result
    }

    fn check(&mut self, req: &Request, update: bool) -> CheckResult {
        let Some(obj) = self.lookup(req.obj_id) else {
            return CheckResult::Miss;
        };

        if obj.is_expired_at(req.clock_time) {
            if update {
                self.unlink(&obj);
                self.metrics.record_expired_removal();
            }
            return CheckResult::Expired;
        }

        if update {
            if let Some(slot) = obj.slot() {
                self.queue.move_to_front(slot);
            }
        }
        CheckResult::Hit
    }

    fn insert(&mut self, req: &Request) -> Option<ObjectRef> {
        let charge = self.charge(req.obj_size);
        if charge > self.cache_size() {
            tracing::debug!(
                obj_id = req.obj_id,
                charge,
                cache_size = self.cache_size(),
                "request larger than the cache"
            );
            return None;
        }

        let indexed = self.index.find(req.obj_id);
        if let Some(old) = indexed.as_ref().filter(|old| old.in_cache()) {
            self.unlink(old);
        } else if indexed.is_some() || self.index.len() < self.queue.len() as u64 {
            // The shared index was written from outside since the last insert.
            self.purge_orphans();
        }
        while self.occupied_size + charge > self.cache_size() {
            if self.evict(req).is_none() {
                break;
            }
        }

        let obj = CacheObject::from_request(req).into_ref();
        if let Some(stale) = self.index.insert(Arc::clone(&obj)) {
            self.unlink(&stale);
        }
        self.queue.push_front(Arc::clone(&obj));
        obj.set_in_cache(true);
        self.occupied_size += charge;
        self.metrics.core.record_insertion(req.obj_size);
        Some(obj)
    }

    fn evict(&mut self, _req: &Request) -> Option<ObjectRef> {
        loop {
            let victim = Arc::clone(self.queue.back()?);
            let orphaned = !victim.in_cache();
            let victim = self.unlink(&victim)?;
            if orphaned {
                continue;
            }
            self.metrics.core.record_eviction();
            tracing::trace!(obj_id = victim.obj_id(), "evicted");
            return Some(victim);
        }
    }

    fn remove(&mut self, obj_id: ObjId) -> Option<ObjectRef> {
        let Some(obj) = self.lookup(obj_id) else {
            tracing::warn!(obj_id, "removing an object that is not cached");
            return None;
        };
        let removed = self.unlink(&obj);
        self.metrics.record_removal();
        removed
    }

    fn to_evict(&self) -> Option<ObjectRef> {
        self.queue.back().cloned()
    }

    fn occupied_size(&self) -> u64 {
        self.occupied_size
    }

    fn cache_size(&self) -> u64 {
        self.params.cache_size()
    }

    fn per_obj_overhead(&self) -> u64 {
        self.params.per_obj_overhead()
    }

    fn n_obj(&self) -> u64 {
        self.queue.len() as u64
    }

    fn contains(&self, obj_id: ObjId) -> bool {
        self.lookup(obj_id).is_some()
    }
}

impl CacheMetrics for LruCache {
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.metrics.metrics()
    }

    fn algorithm_name(&self) -> &'static str {
        self.metrics.algorithm_name()
    }
}

impl Drop for LruCache {
    fn drop(&mut self) {
        // The index may outlive the cache through a shared handle.
        while let Some(obj) = self.queue.pop_back() {
            self.index.delete_exact(&obj);
        }
    }
}

impl fmt::Debug for LruCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("cache_size", &self.params.cache_size())
            .field("occupied_size", &self.occupied_size)
            .field("n_obj", &self.queue.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;

    fn cache(size: u64) -> LruCache {
        LruCache::init(CommonCacheParams::new(size).with_hashpower(6))
    }

    fn ids(cache: &LruCache) -> Vec<ObjId> {
        cache.iter().map(|obj| obj.obj_id()).collect()
    }

    #[test]
    fn test_lru_get_hit_and_miss() {
        let mut cache = cache(30);
        assert_eq!(cache.get(&Request::new(1, 10)), CheckResult::Miss);
        assert_eq!(cache.get(&Request::new(2, 10)), CheckResult::Miss);
        assert_eq!(cache.get(&Request::new(1, 10)), CheckResult::Hit);
        assert_eq!(cache.n_obj(), 2);
        assert_eq!(cache.occupied_size(), 20);
        assert_eq!(ids(&cache), vec![1, 2]);
    }

    #[test]
    fn test_lru_evicts_least_recent() {
        let mut cache = cache(30);
        for id in 1..=3 {
            cache.get(&Request::new(id, 10));
        }
        cache.get(&Request::new(1, 10));
        cache.get(&Request::new(4, 10));

        assert!(!cache.contains(2));
        assert_eq!(ids(&cache), vec![4, 1, 3]);
        assert_eq!(cache.occupied_size(), 30);
    }

    #[test]
    fn test_lru_check_without_update_keeps_order() {
        let mut cache = cache(30);
        for id in 1..=3 {
            cache.get(&Request::new(id, 10));
        }
        assert_eq!(cache.check(&Request::new(1, 10), false), CheckResult::Hit);
        assert_eq!(ids(&cache), vec![3, 2, 1]);
        assert_eq!(cache.to_evict().map(|o| o.obj_id()), Some(1));

        assert_eq!(cache.check(&Request::new(1, 10), true), CheckResult::Hit);
        assert_eq!(ids(&cache), vec![1, 3, 2]);
        assert_eq!(cache.lru_metrics().core.requests, 3);
    }

    #[test]
    fn test_lru_variable_sizes_evict_several() {
        let mut cache = cache(100);
        for id in 1..=4 {
            cache.get(&Request::new(id, 25));
        }
        cache.get(&Request::new(9, 60));
        assert_eq!(ids(&cache), vec![9, 4]);
        assert_eq!(cache.occupied_size(), 85);
        assert_eq!(cache.lru_metrics().core.evictions, 3);
    }

    #[test]
    fn test_lru_per_object_overhead() {
        let mut cache = LruCache::init(
            CommonCacheParams::new(100)
                .with_per_obj_overhead(10)
                .with_hashpower(4),
        );
        cache.get(&Request::new(1, 40));
        cache.get(&Request::new(2, 40));
        assert_eq!(cache.occupied_size(), 100);
        assert!(!cache.has_room(0));

        // 95 + 10 overhead never fits.
        assert!(!cache.can_admit(95));
        assert_eq!(cache.get(&Request::new(3, 95)), CheckResult::Miss);
        assert!(!cache.contains(3));
        assert_eq!(cache.n_obj(), 2);
    }

    #[test]
    fn test_lru_expired_object_is_readmitted() {
        let mut cache = cache(100);
        cache.get(&Request::new(1, 10).at(0).with_ttl(5));

        assert_eq!(cache.check(&Request::new(1, 10).at(4), false), CheckResult::Hit);
        assert_eq!(cache.check(&Request::new(1, 10).at(5), false), CheckResult::Expired);
        assert!(cache.contains(1));

        assert_eq!(cache.get(&Request::new(1, 10).at(5)), CheckResult::Expired);
        assert_eq!(cache.get(&Request::new(1, 10).at(6)), CheckResult::Hit);
        assert_eq!(cache.lru_metrics().expired_removals, 1);
        assert_eq!(cache.lru_metrics().core.expired, 1);
    }

    #[test]
    fn test_lru_insert_replaces_existing() {
        let mut cache = cache(100);
        let first = cache.insert(&Request::new(1, 10)).unwrap();
        let second = cache.insert(&Request::new(1, 30)).unwrap();

        assert!(!first.in_cache());
        assert!(second.in_cache());
        assert_eq!(cache.n_obj(), 1);
        assert_eq!(cache.occupied_size(), 30);
        assert!(Arc::ptr_eq(&cache.index().find(1).unwrap(), &second));
    }

    #[test]
    fn test_lru_remove_is_idempotent() {
        let mut cache = cache(100);
        cache.get(&Request::new(1, 10));
        let removed = cache.remove(1).expect("object was cached");
        assert!(!removed.in_cache());
        assert!(cache.remove(1).is_none());
        assert_eq!(cache.n_obj(), 0);
        assert_eq!(cache.occupied_size(), 0);
        assert!(cache.index().is_empty());
    }

    #[test]
    fn test_lru_evict_empty() {
        let mut cache = cache(10);
        assert!(cache.evict(&Request::new(0, 0)).is_none());
        assert!(cache.to_evict().is_none());
    }

    #[test]
    fn test_lru_unlinked_index_entry_is_a_miss() {
        let mut cache = cache(100);
        cache
            .index()
            .insert(CacheObject::new(5, 10, None).into_ref());
        assert_eq!(cache.check(&Request::new(5, 10), true), CheckResult::Miss);
        assert!(!cache.contains(5));

        cache.get(&Request::new(5, 10));
        assert!(cache.contains(5));
        assert_eq!(cache.index().len(), 1);
        assert_eq!(cache.n_obj(), 1);
    }

    #[test]
    fn test_lru_replaced_index_entry_leaves_one_live_copy() {
        let mut cache = cache(100);
        cache.get(&Request::new(1, 10));
        let foreign = CacheObject::new(1, 10, None).into_ref();
        let displaced = cache
            .index()
            .insert(Arc::clone(&foreign))
            .expect("object 1 was indexed");
        assert!(!displaced.in_cache());
        assert!(!cache.contains(1));

        assert_eq!(cache.get(&Request::new(1, 10)), CheckResult::Miss);
        assert_eq!(cache.n_obj(), 1);
        assert_eq!(cache.occupied_size(), 10);
        assert_eq!(cache.index().len(), 1);
        assert!(cache.contains(1));

        let victim = cache.evict(&Request::new(0, 0)).expect("object 1 is cached");
        assert_eq!(victim.obj_id(), 1);
        assert!(!Arc::ptr_eq(&victim, &foreign));
        assert!(!Arc::ptr_eq(&victim, &displaced));
        assert!(!cache.contains(1));
        assert_eq!(cache.n_obj(), 0);
        assert_eq!(cache.occupied_size(), 0);
        assert!(cache.index().is_empty());
    }

    #[test]
    fn test_lru_deleted_index_entry_releases_its_bytes() {
        let mut cache = cache(100);
        cache.get(&Request::new(1, 10));
        cache.get(&Request::new(2, 10));
        assert!(cache.index().delete(1).is_some());
        assert!(!cache.contains(1));

        assert_eq!(cache.get(&Request::new(1, 10)), CheckResult::Miss);
        assert_eq!(cache.n_obj(), 2);
        assert_eq!(cache.occupied_size(), 20);
        assert_eq!(ids(&cache), vec![1, 2]);
        assert_eq!(cache.index().len(), 2);
    }

    #[test]
    fn test_lru_evict_skips_objects_deleted_from_the_index() {
        let mut cache = cache(100);
        cache.get(&Request::new(1, 10));
        cache.get(&Request::new(2, 10));
        cache.index().delete(1);

        let victim = cache.evict(&Request::new(0, 0)).expect("object 2 is cached");
        assert_eq!(victim.obj_id(), 2);
        assert_eq!(cache.n_obj(), 0);
        assert_eq!(cache.occupied_size(), 0);
        assert_eq!(cache.lru_metrics().core.evictions, 1);
        assert!(cache.evict(&Request::new(0, 0)).is_none());
    }

    #[test]
    fn test_lru_drop_keeps_foreign_index_entries() {
        let (cache_index, foreign) = {
            let mut cache = cache(100);
            cache.get(&Request::new(1, 10));
            let foreign = CacheObject::new(1, 10, None).into_ref();
            cache.index().insert(Arc::clone(&foreign));
            (Arc::clone(cache.index()), foreign)
        };
        let found = cache_index.find(1).expect("foreign entry survives");
        assert!(Arc::ptr_eq(&found, &foreign));
    }

    #[test]
    fn test_lru_drop_clears_shared_index() {
        let cache_index = {
            let mut cache = cache(100);
            cache.get(&Request::new(1, 10));
            Arc::clone(cache.index())
        };
        assert!(cache_index.is_empty());
    }

    #[test]
    fn test_lru_try_init_rejects_bad_params() {
        let err = LruCache::try_init(CommonCacheParams::new(0)).unwrap_err();
        assert!(matches!(err, CacheError::InvalidConfig(_)));
    }

    #[test]
    fn test_lru_metrics() {
        let mut cache = cache(20);
        let metrics = cache.metrics();
        assert_eq!(metrics.get("requests").unwrap(), &0.0);

        cache.get(&Request::new(1, 10));
        cache.get(&Request::new(2, 10));
        cache.get(&Request::new(1, 10));
        cache.get(&Request::new(3, 10));

        let metrics = cache.metrics();
        assert_eq!(metrics.get("requests").unwrap(), &4.0);
        assert_eq!(metrics.get("cache_hits").unwrap(), &1.0);
        assert_eq!(metrics.get("cache_misses").unwrap(), &3.0);
        assert_eq!(metrics.get("insertions").unwrap(), &3.0);
        assert_eq!(metrics.get("evictions").unwrap(), &1.0);
        assert_eq!(cache.algorithm_name(), "LRU");
    }
}
