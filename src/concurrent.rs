//! Concurrent Object Index
//!
//! This module provides the lock-striped hash table that every eviction policy
//! uses as its authoritative object index, and the lock pool it is built on.
//!
//! # Architecture
//!
//! - A [`LockPool`] holds a power-of-two number of `parking_lot::RwLock`s and
//!   selects one by masking a hash value.
//! - A [`ConcurrentIndex`] hashes each object id once. The low `hashpower` bits
//!   select the bucket, and the low bits of the bucket select the stripe lock,
//!   so no second hash is ever computed.
//!
//! ## Why RwLock Instead of Mutex?
//!
//! Unlike a full cache, the index has genuine read-only operations: `find` and
//! `random_object` never modify a chain. Readers on the same stripe proceed in
//! parallel and only `insert`/`delete` take the stripe exclusively.
//!
//! # Boundary With the Eviction Policies
//!
//! The index is the only concurrent structure in this crate. The eviction
//! policies ([`LruCache`](crate::LruCache), [`SlruCache`](crate::SlruCache))
//! take `&mut self` and must be serialized by the caller, for example with a
//! `parking_lot::Mutex`. Their indexes are exposed as `Arc<ConcurrentIndex>` so
//! that other threads can keep running lookups while the owner mutates.
//!
//! # Example
//!
//! ```rust
//! use simcache::concurrent::ConcurrentIndex;
//! use simcache::CacheObject;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let index = Arc::new(ConcurrentIndex::new(14));
//!
//! let handles: Vec<_> = (0..4u64).map(|t| {
//!     let index = Arc::clone(&index);
//!     thread::spawn(move || {
//!         for i in 0..1000 {
//!             let id = t * 1000 + i;
//!             index.insert(CacheObject::new(id, 1, None).into_ref());
//!             assert!(index.find(id).is_some());
//!         }
//!     })
//! }).collect();
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! assert_eq!(index.len(), 4000);
//! ```

mod index;
mod lock_pool;

pub use self::index::{ConcurrentIndex, MAX_HASHPOWER};
pub use self::lock_pool::LockPool;
