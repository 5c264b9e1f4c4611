//! Concurrent chained hash table mapping object ids to cache objects.
//!
//! ```text
//!   Lock pool (4 stripes)        Buckets (hashpower = 3)
//!   ┌────────────┐               ┌──────────┐
//!   │ stripe 0   │ ── guards ──▶ │ bucket 0 │ ──▶ obj ──▶ obj
//!   │ stripe 1   │ ── guards ──▶ │ bucket 1 │ ──▶ obj
//!   │ stripe 2   │ ── guards ──▶ │ bucket 2 │
//!   │ stripe 3   │ ── guards ──▶ │ bucket 3 │ ──▶ obj
//!   └────────────┘       │       │ bucket 4 │  (stripe 0)
//!                        └─────▶ │  ...     │
//!                                └──────────┘
//!   stripe = bucket & (stripes - 1)
//! ```
//!
//! The table has `2^hashpower` buckets and `2^max(hashpower - 10, 0)` stripes,
//! i.e. one lock per 1024 buckets. Lock memory stays bounded regardless of the
//! table size; the price is that unrelated buckets sharing a stripe serialize
//! their writers.
//!
//! Every operation takes exactly one stripe lock, shared for reads and exclusive
//! for mutations, and releases it before returning. The table never drops the
//! objects it unlinks: they are returned to the caller.

use super::lock_pool::LockPool;
use crate::error::{fatal, CacheError, CacheResult};
use crate::object::{CacheObject, ObjId, ObjectRef};
use crate::request::Request;
use ahash::RandomState;
use core::fmt;
use core::mem;
use core::ptr;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Largest accepted `hashpower`.
pub const MAX_HASHPOWER: u32 = 40;

/// log2 of the number of buckets sharing one stripe lock.
const BUCKETS_PER_STRIPE_POWER: u32 = 10;

type Link = Option<Box<HashLink>>;

struct HashLink {
    obj: ObjectRef,
    hash_next: Link,
}

/// Bucket heads owned by one stripe. Global bucket `b` is stored at `b >> locks_power`.
struct StripeBuckets {
    heads: Box<[Link]>,
}

impl StripeBuckets {
    fn try_new(buckets: usize) -> CacheResult<Self> {
        let mut heads = Vec::new();
        heads
            .try_reserve_exact(buckets)
            .map_err(|_| CacheError::AllocFailed {
                what: "hash table",
                bytes: buckets.saturating_mul(mem::size_of::<Link>()),
            })?;
        heads.resize_with(buckets, || None);
        Ok(Self {
            heads: heads.into_boxed_slice(),
        })
    }
}

impl Drop for StripeBuckets {
    fn drop(&mut self) {
        // Unlink iteratively so long chains cannot overflow the stack.
        for head in self.heads.iter_mut() {
            let mut link = head.take();
            while let Some(mut node) = link {
                link = node.hash_next.take();
            }
        }
    }
}

/// Returns the link that holds `obj_id`, or the empty link ending the chain.
fn find_link_mut(mut link: &mut Link, obj_id: ObjId) -> &mut Link {
    while link
        .as_ref()
        .is_some_and(|node| node.obj.obj_id() != obj_id)
    {
        if let Some(node) = link {
            link = &mut node.hash_next;
        }
    }
    link
}

/// Lock-striped chained hash table of cache objects.
///
/// # Examples
///
/// ```
/// use simcache::concurrent::ConcurrentIndex;
/// use simcache::CacheObject;
///
/// let index = ConcurrentIndex::new(12);
/// index.insert(CacheObject::new(7, 512, None).into_ref());
///
/// assert_eq!(index.find(7).map(|obj| obj.obj_size()), Some(512));
/// assert!(index.delete(7).is_some());
/// assert!(index.find(7).is_none());
/// ```
pub struct ConcurrentIndex {
    hash_builder: RandomState,
    hashpower: u32,
    hash_mask: u64,
    locks_power: u32,
    stripes: LockPool<StripeBuckets>,
    n_obj: AtomicU64,
}

impl ConcurrentIndex {
    /// Creates a table of `2^hashpower` buckets.
    pub fn try_new(hashpower: u32) -> CacheResult<Self> {
        if hashpower > MAX_HASHPOWER {
            return Err(CacheError::InvalidConfig(format!(
                "hashpower {hashpower} exceeds the maximum of {MAX_HASHPOWER}"
            )));
        }
        let locks_power = hashpower.saturating_sub(BUCKETS_PER_STRIPE_POWER);
        let buckets_per_stripe = 1usize << (hashpower - locks_power);
        let stripes = LockPool::try_new(locks_power, |_| {
            StripeBuckets::try_new(buckets_per_stripe)
        })?;

        tracing::debug!(
            hashpower,
            stripes = stripes.len(),
            "created concurrent index"
        );

        Ok(Self {
            // Fixed seeds keep bucket placement reproducible between simulation runs.
            hash_builder: RandomState::with_seeds(
                0xbb8c484891ec6c86,
                0x0522a25ae9c769f9,
                0xeed2797b9571bc75,
                0x4feb29c1fbbd59d0,
            ),
            hashpower,
            hash_mask: (1u64 << hashpower) - 1,
            locks_power,
            stripes,
            n_obj: AtomicU64::new(0),
        })
    }

    /// Creates a table of `2^hashpower` buckets; failure terminates the process.
    pub fn new(hashpower: u32) -> Self {
        Self::try_new(hashpower).unwrap_or_else(|err| fatal(err))
    }

    #[inline]
    fn bucket_of(&self, obj_id: ObjId) -> u64 {
        self.hash_builder.hash_one(obj_id) & self.hash_mask
    }

    #[inline]
    fn local_index(&self, bucket: u64) -> usize {
        (bucket >> self.locks_power) as usize
    }

    /// Looks up `obj_id`.
    pub fn find(&self, obj_id: ObjId) -> Option<ObjectRef> {
        let bucket = self.bucket_of(obj_id);
        let stripe = self.stripes.get(bucket).read();

        let mut link = &stripe.heads[self.local_index(bucket)];
        while let Some(node) = link {
            if node.obj.obj_id() == obj_id {
                return Some(Arc::clone(&node.obj));
            }
            link = &node.hash_next;
        }
        None
    }

    /// Returns `true` if `obj_id` is indexed.
    #[inline]
    pub fn contains(&self, obj_id: ObjId) -> bool {
        self.find(obj_id).is_some()
    }

    /// Indexes `obj`, replacing any object with the same id.
    ///
    /// The new object starts with `in_cache == false`; the eviction policy sets
    /// it once the object is linked. A replaced object is marked not in cache
    /// and returned.
    pub fn insert(&self, obj: ObjectRef) -> Option<ObjectRef> {
        let obj_id = obj.obj_id();
        let bucket = self.bucket_of(obj_id);
        let mut stripe = self.stripes.get(bucket).write();
        let head = &mut stripe.heads[self.local_index(bucket)];

        obj.set_in_cache(false);
        if let Some(node) = find_link_mut(head, obj_id) {
            let old = mem::replace(&mut node.obj, obj);
            old.set_in_cache(false);
            return Some(old);
        }

        let hash_next = head.take();
        *head = Some(Box::new(HashLink { obj, hash_next }));
        self.n_obj.fetch_add(1, Ordering::AcqRel);
        None
    }

    /// Builds an object from `req` and indexes it.
    ///
    /// Returns the new object and the object it replaced, if any.
    pub fn insert_request(&self, req: &Request) -> (ObjectRef, Option<ObjectRef>) {
        let obj = CacheObject::from_request(req).into_ref();
        let old = self.insert(Arc::clone(&obj));
        (obj, old)
    }

    /// Unlinks `obj_id`, marking it not in cache, and returns it.
    pub fn delete(&self, obj_id: ObjId) -> Option<ObjectRef> {
        let bucket = self.bucket_of(obj_id);
        let mut stripe = self.stripes.get(bucket).write();
        let link = find_link_mut(&mut stripe.heads[self.local_index(bucket)], obj_id);

        self.take_link(link)
    }

    /// Unlinks `obj` only if it is the object indexed under its id.
    ///
    /// An entry that replaced `obj` is left in place.
    pub fn delete_exact(&self, obj: &CacheObject) -> bool {
        let bucket = self.bucket_of(obj.obj_id());
        let mut stripe = self.stripes.get(bucket).write();
        let link = find_link_mut(&mut stripe.heads[self.local_index(bucket)], obj.obj_id());

        if !link.as_ref().is_some_and(|node| ptr::eq(&*node.obj, obj)) {
            return false;
        }
        self.take_link(link).is_some()
    }

    fn take_link(&self, link: &mut Link) -> Option<ObjectRef> {
        let HashLink { obj, hash_next } = *link.take()?;
        *link = hash_next;
        obj.set_in_cache(false);
        self.n_obj.fetch_sub(1, Ordering::AcqRel);
        Some(obj)
    }

    /// Unlinks the entry with `obj`'s id.
    #[inline]
    pub fn delete_object(&self, obj: &CacheObject) {
        self.delete(obj.obj_id());
    }

    /// Unlinks the entry with `obj`'s id, returning whether one existed.
    #[inline]
    pub fn try_delete(&self, obj: &CacheObject) -> bool {
        self.delete(obj.obj_id()).is_some()
    }

    /// Returns the head of a randomly drawn non-empty bucket.
    ///
    /// Buckets are drawn uniformly and redrawn while empty, so this is *not* a
    /// uniform sample over objects: only bucket heads can be returned, and an
    /// object alone in its bucket is as likely as the head of a long chain.
    /// Returns `None` once the table is empty.
    pub fn random_object(&self) -> Option<ObjectRef> {
        let mut rng = rand::thread_rng();
        while !self.is_empty() {
            let bucket = rng.gen::<u64>() & self.hash_mask;
            let stripe = self.stripes.get(bucket).read();
            if let Some(node) = &stripe.heads[self.local_index(bucket)] {
                return Some(Arc::clone(&node.obj));
            }
        }
        None
    }

    /// Returns the number of indexed objects.
    #[inline]
    pub fn len(&self) -> u64 {
        self.n_obj.load(Ordering::Acquire)
    }

    /// Returns `true` if no object is indexed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns log2 of the bucket count.
    #[inline]
    pub fn hashpower(&self) -> u32 {
        self.hashpower
    }

    /// Returns the number of buckets.
    #[inline]
    pub fn bucket_count(&self) -> u64 {
        1u64 << self.hashpower
    }

    /// Returns the number of stripe locks.
    #[inline]
    pub fn stripe_count(&self) -> usize {
        self.stripes.len()
    }

    /// Returns the length of the longest chain, taking each stripe's read lock
    /// in turn.
    pub fn max_chain_len(&self) -> usize {
        self.stripes
            .iter()
            .map(|lock| {
                let stripe = lock.read();
                stripe
                    .heads
                    .iter()
                    .map(|head| {
                        let mut len = 0;
                        let mut link = head;
                        while let Some(node) = link {
                            len += 1;
                            link = &node.hash_next;
                        }
                        len
                    })
                    .max()
                    .unwrap_or(0)
            })
            .max()
            .unwrap_or(0)
    }
}

impl fmt::Debug for ConcurrentIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentIndex")
            .field("hashpower", &self.hashpower)
            .field("stripes", &self.stripes.len())
            .field("n_obj", &self.len())
            .finish()
    }
}
