//! Stress Tests for the Concurrent Index
//!
//! These tests verify thread safety and correctness of the lock-striped index
//! under high contention, and of caches shared behind a mutex.

use parking_lot::Mutex;
use scoped_threadpool::Pool;
use simcache::concurrent::ConcurrentIndex;
use simcache::config::{CommonCacheParams, SlruParams};
use simcache::{Cache, CacheObject, ObjId, Request, SlruCache};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

const NUM_THREADS: u64 = 16;
const OPS_PER_THREAD: u64 = 10_000;

fn object(id: ObjId) -> Arc<CacheObject> {
    // Size derived from the id so readers can check they got the right object.
    CacheObject::new(id, id * 2 + 1, None).into_ref()
}

/// Disjoint key ranges: every insert and delete must be accounted for.
#[test]
fn stress_index_disjoint_writers() {
    let index = Arc::new(ConcurrentIndex::new(14));

    let mut handles = Vec::new();
    for t in 0..NUM_THREADS {
        let index = Arc::clone(&index);
        handles.push(thread::spawn(move || {
            let base = t * OPS_PER_THREAD;
            for id in base..base + OPS_PER_THREAD {
                assert!(index.insert(object(id)).is_none());
            }
            for id in (base..base + OPS_PER_THREAD).step_by(2) {
                assert!(index.delete(id).is_some());
            }
        }));
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    assert_eq!(index.len(), NUM_THREADS * OPS_PER_THREAD / 2);
    for id in 0..NUM_THREADS * OPS_PER_THREAD {
        assert_eq!(index.contains(id), id % 2 == 1);
    }
}

/// High contention on a handful of keys: the object count must match what
/// is actually reachable.
#[test]
fn stress_index_same_keys_contention() {
    const KEYS: u64 = 10;
    let index = Arc::new(ConcurrentIndex::new(4));

    let mut handles = Vec::new();
    for t in 0..NUM_THREADS {
        let index = Arc::clone(&index);
        handles.push(thread::spawn(move || {
            for i in 0..OPS_PER_THREAD {
                let id = i % KEYS;
                match (t + i) % 3 {
                    0 => {
                        index.insert(object(id));
                    }
                    1 => {
                        index.delete(id);
                    }
                    _ => {
                        if let Some(found) = index.find(id) {
                            assert_eq!(found.obj_id(), id);
                        }
                    }
                }
            }
        }));
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let reachable = (0..KEYS).filter(|id| index.contains(*id)).count() as u64;
    assert_eq!(index.len(), reachable);
}

/// Lookups racing with overwrites only ever see whole objects.
#[test]
fn stress_find_sees_consistent_objects() {
    let index = ConcurrentIndex::new(12);
    for id in 0..1_000 {
        index.insert(object(id));
    }

    let mut pool = Pool::new(8);
    pool.scoped(|scope| {
        for t in 0..8u64 {
            let index = &index;
            scope.execute(move || {
                for round in 0..5_000u64 {
                    let id = (round * 7919 + t * 104_729) % 1_000;
                    if t % 2 == 0 {
                        let old = index.insert(object(id));
                        if let Some(old) = old {
                            assert_eq!(old.obj_id(), id);
                            assert!(!old.in_cache());
                        }
                    } else if let Some(found) = index.find(id) {
                        assert_eq!(found.obj_id(), id);
                        assert_eq!(found.obj_size(), id * 2 + 1);
                    }
                }
            });
        }
    });

    assert_eq!(index.len(), 1_000);
}

/// Chain length stays sane when many stripes are written at once.
#[test]
fn stress_scoped_pool_across_stripes() {
    let index = ConcurrentIndex::new(16);
    assert_eq!(index.stripe_count(), 64);

    let mut pool = Pool::new(NUM_THREADS as u32);
    pool.scoped(|scope| {
        for t in 0..NUM_THREADS {
            let index = &index;
            scope.execute(move || {
                for i in 0..OPS_PER_THREAD {
                    index.insert(object(i * NUM_THREADS + t));
                }
            });
        }
    });

    assert_eq!(index.len(), NUM_THREADS * OPS_PER_THREAD);
    assert!(index.max_chain_len() < 32);
}

/// `random_object` keeps returning live objects while the table drains and
/// reports `None` once it is empty.
#[test]
fn stress_random_object_while_draining() {
    let index = Arc::new(ConcurrentIndex::new(10));
    for id in 0..4_000 {
        index.insert(object(id));
    }
    let draining = Arc::new(AtomicBool::new(true));

    let sampler = {
        let index = Arc::clone(&index);
        let draining = Arc::clone(&draining);
        thread::spawn(move || {
            let mut samples = 0usize;
            while draining.load(Ordering::Acquire) {
                if let Some(obj) = index.random_object() {
                    assert!(obj.obj_id() < 4_000);
                    samples += 1;
                }
            }
            samples
        })
    };

    let deleters: Vec<_> = (0..4u64)
        .map(|t| {
            let index = Arc::clone(&index);
            thread::spawn(move || {
                for id in (t * 1_000)..((t + 1) * 1_000) {
                    assert!(index.delete(id).is_some());
                }
            })
        })
        .collect();

    for handle in deleters {
        handle.join().expect("Thread panicked");
    }
    draining.store(false, Ordering::Release);
    sampler.join().expect("Thread panicked");

    assert!(index.is_empty());
    assert!(index.random_object().is_none());
}

/// An SLRU shared behind a mutex stays within capacity and counts every request.
#[test]
fn stress_shared_slru_behind_mutex() {
    let params = CommonCacheParams::new(8_192)
        .with_per_obj_overhead(16)
        .with_hashpower(10);
    let cache = Arc::new(Mutex::new(SlruCache::init(params, SlruParams::new(4))));

    let mut handles = Vec::new();
    for t in 0..8u64 {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..2_000u64 {
                let id = (i * 31 + t * 17) % 600;
                let req = Request::new(id, 16 + id % 200).at(i);
                cache.lock().get(&req);
            }
        }));
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let cache = cache.lock();
    for segment in cache.segments() {
        assert!(segment.occupied_size() <= segment.cache_size());
    }
    assert_eq!(cache.slru_metrics().core.requests, 8 * 2_000);
}

/// Segment indexes can be read by other threads while the owner mutates the
/// cache under its lock.
#[test]
fn stress_segment_index_readers() {
    let cache = Arc::new(Mutex::new(SlruCache::init(
        CommonCacheParams::new(4_000).with_hashpower(10),
        SlruParams::new(2),
    )));
    let indexes: Vec<Arc<ConcurrentIndex>> = cache
        .lock()
        .segments()
        .iter()
        .map(|segment| Arc::clone(segment.index()))
        .collect();
    let running = Arc::new(AtomicBool::new(true));
    let found = Arc::new(AtomicUsize::new(0));

    let readers: Vec<_> = (0..4u64)
        .map(|t| {
            let indexes = indexes.clone();
            let running = Arc::clone(&running);
            let found = Arc::clone(&found);
            thread::spawn(move || {
                let mut id = t;
                while running.load(Ordering::Acquire) {
                    for index in &indexes {
                        if let Some(obj) = index.find(id % 500) {
                            assert_eq!(obj.obj_id(), id % 500);
                            found.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                    id += 1;
                }
            })
        })
        .collect();

    {
        let cache = Arc::clone(&cache);
        thread::spawn(move || {
            for i in 0..20_000u64 {
                cache.lock().get(&Request::new((i * 13) % 500, 20));
            }
        })
        .join()
        .expect("Thread panicked");
    }
    running.store(false, Ordering::Release);
    for handle in readers {
        handle.join().expect("Thread panicked");
    }

    let cache = cache.lock();
    let indexed: u64 = indexes.iter().map(|index| index.len()).sum();
    assert_eq!(indexed, cache.n_obj());
    assert!(cache.occupied_size() <= cache.cache_size());
}
