//! Cache Configuration Module
//!
//! This module provides the parameter structures consumed by the cache
//! constructors.
//!
//! # Design Philosophy
//!
//! Parameters are split the way the caches are layered:
//!
//! - [`CommonCacheParams`] describes a single capacity-bounded cache: its byte
//!   budget, the accounting overhead charged per object and the size of its
//!   object index. Every [`LruCache`](crate::LruCache) is built from one.
//! - [`SlruParams`] carries the policy-specific part of an
//!   [`SlruCache`](crate::SlruCache): the number of segments.
//!
//! Both are plain `Copy` values with `with_*` builder methods. `validate()`
//! reports an out-of-range parameter as [`CacheError::InvalidConfig`]; the
//! fallible constructors call it for you.
//!
//! # Sizing Guidelines
//!
//! Occupancy is counted as `obj_size + per_obj_overhead` per object, so
//! `cache_size` is the budget for data *and* per-object metadata:
//!
//! ```text
//! occupied_size = Σ (obj_size + per_obj_overhead)  ≤  cache_size
//! ```
//!
//! An SLRU divides `cache_size` evenly between its segments, so each segment
//! gets `cache_size / n_seg` bytes (segment 0 also takes the remainder).
//!
//! The index should have roughly one bucket per expected object:
//!
//! ```text
//! hashpower ≈ log2(cache_size / average_object_size)
//! ```
//!
//! # Examples
//!
//! ```
//! use simcache::config::{CommonCacheParams, SlruParams};
//! use simcache::SlruCache;
//!
//! // 64MB cache for ~4KB objects, split into 4 segments
//! let params = CommonCacheParams::new(64 * 1024 * 1024)
//!     .with_per_obj_overhead(48)
//!     .with_hashpower(14);
//! let cache = SlruCache::init(params, SlruParams::new(4));
//! ```
//!
//! [`CacheError::InvalidConfig`]: crate::CacheError::InvalidConfig

pub mod cache;
pub mod slru;

pub use cache::CommonCacheParams;
pub use slru::SlruParams;
