//! Cache object records.
//!
//! A [`CacheObject`] is the unit tracked by both the [`ConcurrentIndex`] and the
//! recency list of the segment that holds it. The two share it through an
//! [`ObjectRef`]: the index keeps a lookup reference, the recency list keeps the
//! structural one. Removing an object from either hands the reference back to
//! the caller, who decides whether to keep or drop it.
//!
//! # The `in_cache` flag
//!
//! ```text
//!   allocated ──(linked into a recency list)──▶ in_cache = true
//!       ▲                                             │
//!       └──────────(evicted / removed / replaced)─────┘  in_cache = false
//! ```
//!
//! An object that is indexed but not yet linked, or evicted but still reachable
//! through a stale reference, reports `in_cache == false`.
//!
//! [`ConcurrentIndex`]: crate::concurrent::ConcurrentIndex

use crate::list::SlotId;
use crate::request::Request;
use core::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Object identifier.
pub type ObjId = u64;

/// Shared handle to a cache object.
pub type ObjectRef = Arc<CacheObject>;

const NO_SLOT: usize = usize::MAX;

/// A cached object.
pub struct CacheObject {
    obj_id: ObjId,
    obj_size: u64,
    exp_time: Option<u64>,
    in_cache: AtomicBool,
    /// Slot in the recency list of the owning segment.
    slot: AtomicUsize,
}

impl CacheObject {
    /// Creates an object that is neither indexed nor linked.
    pub fn new(obj_id: ObjId, obj_size: u64, exp_time: Option<u64>) -> Self {
        Self {
            obj_id,
            obj_size,
            exp_time,
            in_cache: AtomicBool::new(false),
            slot: AtomicUsize::new(NO_SLOT),
        }
    }

    /// Creates an object for the request, stamping `clock_time + ttl` as its
    /// expiration time when the request carries a TTL.
    pub fn from_request(req: &Request) -> Self {
        let exp_time = req.ttl.map(|ttl| req.clock_time.saturating_add(ttl));
        Self::new(req.obj_id, req.obj_size, exp_time)
    }

    /// Wraps the object in a shared handle.
    #[inline]
    pub fn into_ref(self) -> ObjectRef {
        Arc::new(self)
    }

    /// Returns the object identifier.
    #[inline]
    pub fn obj_id(&self) -> ObjId {
        self.obj_id
    }

    /// Returns the object size in bytes.
    #[inline]
    pub fn obj_size(&self) -> u64 {
        self.obj_size
    }

    /// Returns the absolute expiration time, if any.
    #[inline]
    pub fn exp_time(&self) -> Option<u64> {
        self.exp_time
    }

    /// Returns `true` if the object has expired at `clock_time`.
    #[inline]
    pub fn is_expired_at(&self, clock_time: u64) -> bool {
        self.exp_time.is_some_and(|exp| exp <= clock_time)
    }

    /// Returns `true` while an eviction policy has the object linked.
    #[inline]
    pub fn in_cache(&self) -> bool {
        self.in_cache.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn set_in_cache(&self, in_cache: bool) {
        self.in_cache.store(in_cache, Ordering::Release);
    }

    #[inline]
    pub(crate) fn slot(&self) -> Option<SlotId> {
        match self.slot.load(Ordering::Relaxed) {
            NO_SLOT => None,
            idx => Some(SlotId(idx)),
        }
    }

    #[inline]
    pub(crate) fn set_slot(&self, slot: Option<SlotId>) {
        let raw = slot.map_or(NO_SLOT, |id| id.0);
        self.slot.store(raw, Ordering::Relaxed);
    }
}

impl fmt::Debug for CacheObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheObject")
            .field("obj_id", &self.obj_id)
            .field("obj_size", &self.obj_size)
            .field("exp_time", &self.exp_time)
            .field("in_cache", &self.in_cache())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_object_is_not_in_cache() {
        let obj = CacheObject::new(1, 64, None);
        assert!(!obj.in_cache());
        assert!(obj.slot().is_none());
        assert!(!obj.is_expired_at(u64::MAX));
    }

    #[test]
    fn test_expiry_boundary() {
        let obj = CacheObject::from_request(&Request::new(1, 1).at(100).with_ttl(10));
        assert!(!obj.is_expired_at(109));
        assert!(obj.is_expired_at(110));
    }

    #[test]
    fn test_slot_round_trip() {
        let obj = CacheObject::new(1, 1, None);
        obj.set_slot(Some(SlotId(3)));
        assert_eq!(obj.slot(), Some(SlotId(3)));
        obj.set_slot(None);
        assert_eq!(obj.slot(), None);
    }
}
