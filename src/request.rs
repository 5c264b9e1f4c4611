//! Requests issued against a cache and the outcome of looking them up.

use crate::object::{CacheObject, ObjId};

/// A single access from the simulated workload.
///
/// Only the fields the cache engine consumes are modelled: the object identity,
/// its size, the logical time of the access and an optional time-to-live used
/// to stamp an expiration time on objects admitted by this request.
///
/// # Examples
///
/// ```
/// use simcache::Request;
///
/// let req = Request::new(42, 4096).at(100).with_ttl(60);
/// assert_eq!(req.obj_id, 42);
/// assert_eq!(req.ttl, Some(60));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    /// Identifier of the requested object.
    pub obj_id: ObjId,
    /// Size of the object in bytes.
    pub obj_size: u64,
    /// Logical time of the request.
    pub clock_time: u64,
    /// Time-to-live applied when the object is admitted.
    pub ttl: Option<u64>,
}

impl Request {
    /// Creates a request at time zero with no TTL.
    pub fn new(obj_id: ObjId, obj_size: u64) -> Self {
        Self {
            obj_id,
            obj_size,
            clock_time: 0,
            ttl: None,
        }
    }

    /// Sets the logical time of the request.
    #[must_use]
    pub fn at(mut self, clock_time: u64) -> Self {
        self.clock_time = clock_time;
        self
    }

    /// Sets the time-to-live used when the object is admitted.
    #[must_use]
    pub fn with_ttl(mut self, ttl: u64) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Builds the request that re-admits `obj` into another segment at `clock_time`.
    ///
    /// The remaining lifetime is carried over, so an object that has already
    /// expired stays expired after the move.
    pub fn from_object(obj: &CacheObject, clock_time: u64) -> Self {
        Self {
            obj_id: obj.obj_id(),
            obj_size: obj.obj_size(),
            clock_time,
            ttl: obj.exp_time().map(|exp| exp.saturating_sub(clock_time)),
        }
    }
}

/// Outcome of a cache lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckResult {
    /// The object is cached and live.
    Hit,
    /// The object is not cached.
    Miss,
    /// The object was cached but its expiration time has passed.
    Expired,
}

impl CheckResult {
    /// Returns `true` for [`CheckResult::Hit`].
    #[inline]
    pub fn is_hit(self) -> bool {
        self == CheckResult::Hit
    }
}
