//! The operation set shared by every eviction policy.
//!
//! A policy is driven one [`Request`] at a time. [`Cache::get`] is the
//! workload-facing entry point: it looks the object up, refreshes its
//! position on a hit and admits it on a miss. The remaining operations are the
//! building blocks policies use on each other, which is how an
//! [`SlruCache`](crate::SlruCache) is assembled from segment caches.
//!
//! # Accounting
//!
//! Each cached object is charged `obj_size + per_obj_overhead` bytes against
//! `cache_size`. After any operation returns,
//! `occupied_size() <= cache_size()` holds.

use crate::object::{ObjId, ObjectRef};
use crate::request::{CheckResult, Request};

/// Uniform interface over eviction policies.
pub trait Cache {
    /// Short policy name, e.g. `"LRU"`.
    fn name(&self) -> &'static str;

    /// Looks up the request and admits the object on a miss.
    ///
    /// Objects whose charge exceeds [`admission_limit`](Cache::admission_limit)
    /// are never admitted.
    fn get(&mut self, req: &Request) -> CheckResult;

    /// Looks up the request.
    ///
    /// With `update == false` the lookup leaves the cache untouched. With
    /// `update == true` a hit refreshes the object's position and an expired
    /// object is dropped.
    fn check(&mut self, req: &Request, update: bool) -> CheckResult;

    /// Admits a new object for the request, evicting as needed.
    ///
    /// An object already cached under the same id is replaced. Returns the
    /// admitted object, or `None` if it can never fit.
    fn insert(&mut self, req: &Request) -> Option<ObjectRef>;

    /// Evicts the next victim and returns it.
    fn evict(&mut self, req: &Request) -> Option<ObjectRef>;

    /// Removes `obj_id`. Removing an id that is not cached logs a warning and
    /// returns `None`.
    fn remove(&mut self, obj_id: ObjId) -> Option<ObjectRef>;

    /// Returns the object [`evict`](Cache::evict) would pick, without evicting.
    fn to_evict(&self) -> Option<ObjectRef>;

    /// Bytes currently charged against the capacity.
    fn occupied_size(&self) -> u64;

    /// Capacity in bytes.
    fn cache_size(&self) -> u64;

    /// Bytes charged per object on top of its size.
    fn per_obj_overhead(&self) -> u64;

    /// Number of cached objects.
    fn n_obj(&self) -> u64;

    /// Returns `true` if `obj_id` is cached. Never changes the cache.
    fn contains(&self, obj_id: ObjId) -> bool;

    /// Largest charge `get` will admit.
    fn admission_limit(&self) -> u64 {
        self.cache_size()
    }

    /// Returns `true` if an object of `obj_size` bytes may be admitted.
    fn can_admit(&self, obj_size: u64) -> bool {
        obj_size.saturating_add(self.per_obj_overhead()) <= self.admission_limit()
    }

    /// Returns `true` if an object of `obj_size` bytes fits without evicting.
    fn has_room(&self, obj_size: u64) -> bool {
        self.occupied_size()
            .saturating_add(obj_size)
            .saturating_add(self.per_obj_overhead())
            <= self.cache_size()
    }
}
