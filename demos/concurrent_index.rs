//! Concurrent Index Usage
//!
//! Demonstrates the lock-striped index on its own and a shared SLRU whose
//! segment indexes are read by other threads while the owner mutates it.
//!
//! Run with: cargo run --example concurrent_index

use parking_lot::Mutex;
use simcache::concurrent::ConcurrentIndex;
use simcache::config::{CommonCacheParams, SlruParams};
use simcache::{Cache, CacheObject, Request, SlruCache};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

const THREADS: u64 = 8;
const OBJECTS_PER_THREAD: u64 = 50_000;

fn index_throughput() {
    println!("=== Index: {THREADS} writers on disjoint ranges ===");
    for hashpower in [10u32, 14, 18] {
        let index = Arc::new(ConcurrentIndex::new(hashpower));
        let start = Instant::now();

        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let index = Arc::clone(&index);
                thread::spawn(move || {
                    let base = t * OBJECTS_PER_THREAD;
                    for id in base..base + OBJECTS_PER_THREAD {
                        index.insert(CacheObject::new(id, 1, None).into_ref());
                    }
                    for id in base..base + OBJECTS_PER_THREAD {
                        assert!(index.find(id).is_some());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("Thread panicked");
        }

        println!(
            "  hashpower {hashpower:>2}: {:>3} stripes, {} objects, longest chain {:>3}, {:?}",
            index.stripe_count(),
            index.len(),
            index.max_chain_len(),
            start.elapsed()
        );
    }
    println!();
}

fn shared_cache() {
    println!("=== Shared SLRU read through its segment indexes ===");
    let cache = Arc::new(Mutex::new(SlruCache::init(
        CommonCacheParams::new(256 * 1024).with_hashpower(12),
        SlruParams::new(4),
    )));
    let indexes: Vec<Arc<ConcurrentIndex>> = cache
        .lock()
        .segments()
        .iter()
        .map(|segment| Arc::clone(segment.index()))
        .collect();

    let running = Arc::new(AtomicBool::new(true));
    let lookups = Arc::new(AtomicU64::new(0));
    let found = Arc::new(AtomicU64::new(0));

    let readers: Vec<_> = (0..4u64)
        .map(|t| {
            let indexes = indexes.clone();
            let running = Arc::clone(&running);
            let lookups = Arc::clone(&lookups);
            let found = Arc::clone(&found);
            thread::spawn(move || {
                let mut id = t;
                while running.load(Ordering::Acquire) {
                    let hit = indexes.iter().any(|index| index.contains(id % 4_000));
                    lookups.fetch_add(1, Ordering::Relaxed);
                    if hit {
                        found.fetch_add(1, Ordering::Relaxed);
                    }
                    id = id.wrapping_add(7);
                }
            })
        })
        .collect();

    let writers: Vec<_> = (0..2u64)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..100_000u64 {
                    let id = (i * 13 + t) % 4_000;
                    cache.lock().get(&Request::new(id, 64 + id % 512).at(i));
                }
            })
        })
        .collect();

    for handle in writers {
        handle.join().expect("Thread panicked");
    }
    running.store(false, Ordering::Release);
    for handle in readers {
        handle.join().expect("Thread panicked");
    }

    let cache = cache.lock();
    println!(
        "  {} objects cached in {} of {} bytes",
        cache.n_obj(),
        cache.occupied_size(),
        cache.cache_size()
    );
    println!(
        "  readers found {} of {} ids while the cache was changing",
        found.load(Ordering::Relaxed),
        lookups.load(Ordering::Relaxed)
    );
    println!("  {:?}", *cache);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    index_throughput();
    shared_cache();
}
