//! SLRU Walkthrough
//!
//! Replays a short trace against a three-segment SLRU and prints where each
//! object lives after every request, then compares hit rates against LRU on a
//! workload with a hot set and a scan.
//!
//! Run with: cargo run --example slru_walkthrough
//! Set `RUST_LOG=simcache=trace` to see promotions and demotions.

use simcache::config::{CommonCacheParams, SlruParams};
use simcache::metrics::CacheMetrics;
use simcache::{Cache, LruCache, Request, SlruCache};
use tracing_subscriber::EnvFilter;

fn print_segments(cache: &SlruCache) {
    for (i, segment) in cache.segments().iter().enumerate() {
        let ids: Vec<_> = segment.iter().map(|obj| obj.obj_id()).collect();
        println!(
            "    segment {i}: {:>3}/{} bytes  {ids:?}",
            segment.occupied_size(),
            segment.cache_size()
        );
    }
}

fn walkthrough() {
    println!("=== Three segments of 30 bytes, 10-byte objects ===\n");
    let mut cache = SlruCache::init(
        CommonCacheParams::new(90).with_hashpower(6),
        SlruParams::new(3),
    );

    let trace = [1, 2, 3, 1, 1, 4, 5, 6, 7, 2, 2, 8, 9, 1, 10, 11];
    for (t, id) in trace.into_iter().enumerate() {
        let result = cache.get(&Request::new(id, 10).at(t as u64));
        println!("t={t:<2} get({id:<2}) -> {result:?}");
        print_segments(&cache);
    }

    let metrics = cache.slru_metrics();
    println!(
        "\nhits per segment {:?}, promotions {}, demotions {}, evictions {}\n",
        metrics.segment_hits, metrics.promotions, metrics.demotions, metrics.core.evictions
    );
}

fn scan_comparison() {
    println!("=== Hot set of 40 objects interleaved with a 2000-object scan ===\n");
    let params = CommonCacheParams::new(64 * 100).with_hashpower(10);
    let mut lru = LruCache::init(params);
    let mut slru = SlruCache::init(params, SlruParams::new(4));

    let mut t = 0u64;
    let mut scan_id = 1_000u64;
    for round in 0..50 {
        for hot in 0..40u64 {
            for cache in [&mut lru as &mut dyn Cache, &mut slru as &mut dyn Cache] {
                cache.get(&Request::new(hot, 100).at(t));
            }
            t += 1;
        }
        if round % 2 == 0 {
            for _ in 0..80 {
                for cache in [&mut lru as &mut dyn Cache, &mut slru as &mut dyn Cache] {
                    cache.get(&Request::new(scan_id, 100).at(t));
                }
                scan_id += 1;
                t += 1;
            }
        }
    }

    for (name, metrics) in [
        (lru.algorithm_name(), lru.metrics()),
        (slru.algorithm_name(), slru.metrics()),
    ] {
        println!(
            "{name:<5} hit rate {:.3}  evictions {}",
            metrics["hit_rate"], metrics["evictions"]
        );
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    walkthrough();
    scan_comparison();
}
