#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! # Code Reference
//!
//! ## Layering
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │  SlruCache<C: Cache>        segment 0 … segment n-1         │
//! │        │ promote / cool / evict                             │
//! │        ▼                                                    │
//! │  LruCache (one per segment)                                 │
//! │   ├── RecencyList   MRU ◀──▶ … ◀──▶ LRU                    │
//! │   └── Arc<ConcurrentIndex>                                  │
//! │          └── LockPool<RwLock<stripe buckets>>               │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Reference
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SlruCache`] | Segmented LRU over any [`Cache`] |
//! | [`LruCache`] | Byte-bounded LRU, the default segment type |
//! | [`ConcurrentIndex`](concurrent::ConcurrentIndex) | Lock-striped chained hash table |
//! | [`LockPool`](concurrent::LockPool) | Power-of-two pool of `RwLock`s |
//!
//! ## Driving a cache
//!
//! ```rust
//! use simcache::config::CommonCacheParams;
//! use simcache::{Cache, CheckResult, LruCache, Request};
//!
//! let mut cache = LruCache::init(CommonCacheParams::new(1024).with_hashpower(6));
//! let trace = [(1, 512), (2, 256), (1, 512), (3, 512)];
//!
//! let hits = trace
//!     .iter()
//!     .enumerate()
//!     .filter(|(t, (id, size))| {
//!         cache.get(&Request::new(*id, *size).at(*t as u64)) == CheckResult::Hit
//!     })
//!     .count();
//! assert_eq!(hits, 1);
//! ```
//!
//! ## Modules
//!
//! - [`cache`]: the [`Cache`] trait
//! - [`lru`]: LRU cache, also the SLRU segment type
//! - [`slru`]: segmented LRU cache
//! - [`concurrent`]: lock pool and concurrent object index
//! - [`config`]: parameter structures
//! - [`metrics`]: counters for hit rates and object movement
//! - [`error`]: construction errors

/// The operation set shared by every eviction policy.
pub mod cache;

/// Cache configuration structures.
pub mod config;

/// Concurrent object index and the lock pool it is built on.
pub mod concurrent;

/// Error types.
pub mod error;

/// Recency list backing each LRU segment.
///
/// **Note**: This module is internal infrastructure; it keeps a slot handle on
/// every linked object and must only be driven by the cache that owns it.
pub(crate) mod list;

/// Least Recently Used (LRU) cache implementation.
pub mod lru;

/// Cache metrics system.
///
/// Provides metrics collection and reporting for the cache policies through
/// the common [`CacheMetrics`](metrics::CacheMetrics) interface.
pub mod metrics;

/// Cache objects and their shared handles.
pub mod object;

/// Requests and lookup outcomes.
pub mod request;

/// Segmented LRU (SLRU) cache implementation.
///
/// Divides the capacity into equally sized LRU segments so that objects have
/// to be hit repeatedly before they reach the protected end.
pub mod slru;

pub use cache::Cache;
pub use error::{CacheError, CacheResult};
pub use lru::LruCache;
pub use object::{CacheObject, ObjId, ObjectRef};
pub use request::{CheckResult, Request};
pub use slru::SlruCache;
