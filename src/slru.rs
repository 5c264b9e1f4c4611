//! Segmented Least Recently Used (SLRU) Cache Implementation
//!
//! SLRU divides the cache into `n_seg` equally sized LRU segments ordered from
//! cold (segment 0) to hot (segment `n_seg - 1`). An object has to prove itself
//! with repeated hits before it reaches the hot end, so one-time accesses
//! (scans) only churn the cold segments.
//!
//! # How the Algorithm Works
//!
//! ## Segment Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                          SLRU Cache                           │
//! │                                                               │
//! │  segment n-1  MRU ◀──▶ [hot]  ◀──▶ ... ◀──▶ [cool]  LRU       │
//! │                    ▲ promote                  │ demote         │
//! │                    │                          ▼                │
//! │  segment 1    MRU ◀──▶ [warm] ◀──▶ ... ◀──▶ [cool]  LRU       │
//! │                    ▲ promote                  │ demote         │
//! │                    │                          ▼                │
//! │  segment 0    MRU ◀──▶ [new]  ◀──▶ ... ◀──▶ [evict] LRU ──▶ out│
//! │                    ▲                                           │
//! │                    └── insert                                  │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Entry Lifecycle
//!
//! 1. **Insert**: a new object goes into the first segment, counting from 0,
//!    that has room for it. If none has room, segment 0 evicts until it does.
//! 2. **Hit**: the object moves from segment `i` to `i + 1`. A hit in the top
//!    segment only refreshes its recency.
//! 3. **Cooling**: when segment `i` needs room, its LRU object is demoted into
//!    segment `i - 1`, which may in turn have to cool. An object cooled out of
//!    segment 0 leaves the cache.
//! 4. **Eviction**: always from the LRU end of segment 0.
//!
//! ## Cooling Cascade Example
//!
//! ```text
//! Three segments of 10 bytes: S0=[X:10]  S1=[P:4, Y:6]  S2=[Z:10]
//!
//! P:4 is hit in S1 and promoted to S2:
//!   S2 needs room  → Z demoted towards S1
//!   S1 needs room  → Y demoted towards S0
//!   S0 needs room  → X evicted
//!   settle         → S0=[Y]  S1=[Z]  S2=[P]
//! ```
//!
//! The cascade is settled with an explicit work list no deeper than the
//! number of segments, so it never recurses.
//!
//! # Admission
//!
//! An object travels through every segment during its lifetime, so `get`
//! only admits objects that fit in the smallest segment.
//!
//! # Thread Safety
//!
//! Mutating operations take `&mut self`. Share a cache between threads by
//! wrapping it in a `parking_lot::Mutex`; each segment's index can still be
//! read concurrently through [`LruCache::index`].

use crate::cache::Cache;
use crate::config::{CommonCacheParams, SlruParams};
use crate::error::CacheResult;
use crate::lru::LruCache;
use crate::metrics::{CacheMetrics, SlruCacheMetrics};
use crate::object::{ObjId, ObjectRef};
use crate::request::{CheckResult, Request};
use std::collections::BTreeMap;
use std::fmt;

/// Splits `cache_size` between `n_seg` segments; segment 0 takes the remainder.
fn segment_sizes(cache_size: u64, n_seg: usize) -> impl Iterator<Item = u64> {
    let n_seg = n_seg as u64;
    let base = cache_size / n_seg;
    let remainder = cache_size % n_seg;
    (0..n_seg).map(move |i| if i == 0 { base + remainder } else { base })
}

/// A segmented LRU cache.
///
/// Segments are [`LruCache`]s by default. Any [`Cache`] can serve as a segment
/// through [`try_with_segments`](SlruCache::try_with_segments), including
/// another `SlruCache`.
///
/// # Examples
///
/// ```
/// use simcache::config::{CommonCacheParams, SlruParams};
/// use simcache::{Cache, CheckResult, Request, SlruCache};
///
/// let mut cache = SlruCache::init(
///     CommonCacheParams::new(1000).with_hashpower(8),
///     SlruParams::new(2),
/// );
///
/// assert_eq!(cache.get(&Request::new(1, 100)), CheckResult::Miss);
/// assert_eq!(cache.segment_of(1), Some(0));
///
/// assert_eq!(cache.get(&Request::new(1, 100)), CheckResult::Hit);
/// assert_eq!(cache.segment_of(1), Some(1));
/// ```
pub struct SlruCache<C: Cache = LruCache> {
    params: CommonCacheParams,
    segments: Vec<C>,
    admission_limit: u64,
    metrics: SlruCacheMetrics,
}

impl SlruCache<LruCache> {
    /// Creates an empty SLRU of LRU segments.
    pub fn try_init(params: CommonCacheParams, slru_params: SlruParams) -> CacheResult<Self> {
        Self::try_with_segments(params, slru_params, LruCache::try_init)
    }

    /// Creates an empty SLRU of LRU segments.
    ///
    /// # Panics
    /// Panics if the parameters are out of range. Failing to allocate an
    /// index terminates the process.
    pub fn init(params: CommonCacheParams, slru_params: SlruParams) -> Self {
        Self::try_with_segments(params, slru_params, |segment_params| {
            Ok(LruCache::init(segment_params))
        })
        .unwrap_or_else(|err| panic!("{err}"))
    }
}

impl<C: Cache> SlruCache<C> {
    /// Creates an empty SLRU whose segments are built by `factory`.
    ///
    /// `factory` is called once per segment, coldest first, with the common
    /// parameters narrowed to that segment's share of the capacity.
    pub fn try_with_segments(
        params: CommonCacheParams,
        slru_params: SlruParams,
        mut factory: impl FnMut(CommonCacheParams) -> CacheResult<C>,
    ) -> CacheResult<Self> {
        params.validate()?;
        slru_params.validate(params.cache_size())?;

        let segments = segment_sizes(params.cache_size(), slru_params.n_seg())
            .map(|size| factory(params.with_cache_size(size)))
            .collect::<CacheResult<Vec<C>>>()?;
        let admission_limit = segments
            .iter()
            .map(Cache::admission_limit)
            .min()
            .unwrap_or(0);

        tracing::debug!(
            cache_size = params.cache_size(),
            n_seg = segments.len(),
            admission_limit,
            "created SLRU cache"
        );

        Ok(Self {
            params,
            admission_limit,
            metrics: SlruCacheMetrics::new(params.cache_size(), segments.len()),
            segments,
        })
    }

    /// Returns the number of segments.
    pub fn n_seg(&self) -> usize {
        self.segments.len()
    }

    /// Returns segment `i`, 0 being the coldest.
    pub fn segment(&self, i: usize) -> Option<&C> {
        self.segments.get(i)
    }

    /// Returns all segments, coldest first.
    pub fn segments(&self) -> &[C] {
        &self.segments
    }

    /// Returns the segment holding `obj_id`, without touching it.
    pub fn segment_of(&self, obj_id: ObjId) -> Option<usize> {
        self.segments.iter().position(|seg| seg.contains(obj_id))
    }

    /// Returns the counters collected so far.
    pub fn slru_metrics(&self) -> &SlruCacheMetrics {
        &self.metrics
    }

    /// Scans the segments coldest first. Returns the segment and outcome of
    /// the first one that knows the object, or `None` on a miss.
    fn probe(&mut self, req: &Request, update: bool) -> Option<(usize, CheckResult)> {
        for i in 0..self.segments.len() {
            match self.segments[i].check(req, update) {
                CheckResult::Miss => continue,
                CheckResult::Hit => {
                    if update && i + 1 < self.segments.len() {
                        self.promote(i, req);
                    }
                    return Some((i, CheckResult::Hit));
                }
                CheckResult::Expired => return Some((i, CheckResult::Expired)),
            }
        }
        None
    }

    /// Moves `req`'s object from segment `from` to `from + 1`.
    fn promote(&mut self, from: usize, req: &Request) {
        let Some(obj) = self.segments[from].remove(req.obj_id) else {
            return;
        };
        let moved = Request::from_object(&obj, req.clock_time);
        let dest = from + 1;

        self.make_room(dest, moved.obj_size, req);
        if self.segments[dest].has_room(moved.obj_size) {
            self.segments[dest].insert(&moved);
            self.metrics.record_promotion();
            tracing::trace!(obj_id = moved.obj_id, dest, "promoted");
        } else {
            tracing::debug!(
                obj_id = moved.obj_id,
                dest,
                "segment cannot hold the promoted object, dropping it"
            );
            self.metrics.core.record_eviction();
        }
    }

    /// Cools segment `dest` until an object of `obj_size` bytes fits or the
    /// segment stops shrinking.
    fn make_room(&mut self, dest: usize, obj_size: u64, req: &Request) {
        while !self.segments[dest].has_room(obj_size) {
            let before = self.segments[dest].n_obj();
            if before == 0 {
                break;
            }
            self.cool(dest, req);
            if self.segments[dest].n_obj() >= before {
                break;
            }
        }
    }

    /// Evicts one object from segment `level` and demotes it one segment
    /// down, cooling lower segments as needed. An object cooled out of
    /// segment 0 leaves the cache.
    fn cool(&mut self, level: usize, req: &Request) {
        // Demotions waiting for room, deepest segment on top.
        let mut pending: Vec<(usize, Request)> = Vec::with_capacity(level);
        let mut from = level;

        loop {
            match self.segments[from].evict(req) {
                Some(_) if from == 0 => self.metrics.core.record_eviction(),
                Some(victim) => {
                    pending.push((from - 1, Request::from_object(&victim, req.clock_time)));
                    self.metrics.record_demotion();
                    tracing::trace!(obj_id = victim.obj_id(), dest = from - 1, "demoted");
                }
                None => {
                    // `from` cannot shrink, so whatever waits on it is lost.
                    if let Some((dest, stuck)) = pending.pop() {
                        tracing::debug!(obj_id = stuck.obj_id, dest, "dropping demoted object");
                        self.metrics.record_cooling_drop();
                    }
                }
            }

            loop {
                let Some((dest, demoted)) = pending.pop() else {
                    return;
                };
                if self.segments[dest].has_room(demoted.obj_size) {
                    self.segments[dest].insert(&demoted);
                } else if self.segments[dest].n_obj() == 0 {
                    tracing::debug!(
                        obj_id = demoted.obj_id,
                        dest,
                        "segment cannot hold the demoted object, dropping it"
                    );
                    self.metrics.record_cooling_drop();
                } else {
                    pending.push((dest, demoted));
                    from = dest;
                    break;
                }
            }
        }
    }
}

impl<C: Cache> Cache for SlruCache<C> {
    fn name(&self) -> &'static str {
        "SLRU"
    }

    /// Looks the object up, promoting it on a hit, and admits it on a miss.
    ///
    /// Only objects whose size plus per-object overhead fits in the smallest
    /// segment are admitted, not everything that fits in the whole cache. New
    /// objects enter segment 0 and may be moved through every other segment,
    /// so a larger object has nowhere to go. Such objects are reported as
    /// misses on every request and never cached.
    fn get(&mut self, req: &Request) -> CheckResult {
        let result = match self.probe(req, true) {
            Some((segment, CheckResult::Hit)) => {
                self.metrics.record_segment_hit(segment, req.obj_size);
                CheckResult::Hit
            }
            Some((_, CheckResult::Expired)) => {
                self.metrics.core.record_expired(req.obj_size);
                CheckResult::Expired
            }
            _ => {
                self.metrics.core.record_miss(req.obj_size);
                CheckResult::Miss
            }
        };

        if !result.is_hit() {
            if self.can_admit(req.obj_size) {
                self.insert(req);
            } else {
                tracing::trace!(
                    obj_id = req.obj_id,
                    obj_size = req.obj_size,
                    admission_limit = self.admission_limit,
                    "object too large to cache"
                );
            }
        }
        result
    }

    fn check(&mut self, req: &Request, update: bool) -> CheckResult {
        self.probe(req, update)
            .map_or(CheckResult::Miss, |(_, result)| result)
    }

    fn insert(&mut self, req: &Request) -> Option<ObjectRef> {
        let charge = req.obj_size.saturating_add(self.per_obj_overhead());
        if charge > self.segments[0].cache_size() {
            tracing::debug!(obj_id = req.obj_id, charge, "request larger than segment 0");
            return None;
        }

        if let Some(segment) = self.segment_of(req.obj_id) {
            self.segments[segment].remove(req.obj_id);
        }

        let target = (0..self.segments.len())
            .find(|&i| self.segments[i].has_room(req.obj_size))
            .unwrap_or(0);
        if target == 0 {
            while !self.segments[0].has_room(req.obj_size) {
                if self.evict(req).is_none() {
                    break;
                }
            }
        }

        let obj = self.segments[target].insert(req)?;
        self.metrics.core.record_insertion(req.obj_size);
        Some(obj)
    }

    fn evict(&mut self, req: &Request) -> Option<ObjectRef> {
        let victim = self.segments[0].evict(req)?;
        self.metrics.core.record_eviction();
        Some(victim)
    }

    fn remove(&mut self, obj_id: ObjId) -> Option<ObjectRef> {
        let Some(segment) = self.segment_of(obj_id) else {
            tracing::warn!(obj_id, "removing an object that is not cached");
            return None;
        };
        let removed = self.segments[segment].remove(obj_id);
        self.metrics.record_removal();
        removed
    }

    fn to_evict(&self) -> Option<ObjectRef> {
        self.segments[0].to_evict()
    }

    fn occupied_size(&self) -> u64 {
        self.segments.iter().map(Cache::occupied_size).sum()
    }

    fn cache_size(&self) -> u64 {
        self.params.cache_size()
    }

    fn per_obj_overhead(&self) -> u64 {
        self.params.per_obj_overhead()
    }

    fn n_obj(&self) -> u64 {
        self.segments.iter().map(Cache::n_obj).sum()
    }

    fn contains(&self, obj_id: ObjId) -> bool {
        self.segment_of(obj_id).is_some()
    }

    fn admission_limit(&self) -> u64 {
        self.admission_limit
    }
}

impl<C: Cache> CacheMetrics for SlruCache<C> {
    fn metrics(&self) -> BTreeMap<String, f64> {
        let mut metrics = self.metrics.metrics();
        for (i, segment) in self.segments.iter().enumerate() {
            metrics.insert(format!("segment_{i}_n_obj"), segment.n_obj() as f64);
            metrics.insert(
                format!("segment_{i}_occupied_bytes"),
                segment.occupied_size() as f64,
            );
        }
        metrics
    }

    fn algorithm_name(&self) -> &'static str {
        self.metrics.algorithm_name()
    }
}

impl<C: Cache> fmt::Debug for SlruCache<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let occupied: Vec<u64> = self.segments.iter().map(Cache::occupied_size).collect();
        f.debug_struct("SlruCache")
            .field("cache_size", &self.params.cache_size())
            .field("n_seg", &self.segments.len())
            .field("segment_occupied", &occupied)
            .field("n_obj", &self.n_obj())
            .finish()
    }
}
