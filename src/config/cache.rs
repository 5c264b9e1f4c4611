//! Parameters shared by every cache.

use crate::concurrent::MAX_HASHPOWER;
use crate::error::{CacheError, CacheResult};
use core::fmt;

/// Default log2 of the index bucket count.
pub const DEFAULT_HASHPOWER: u32 = 16;

/// Capacity and indexing parameters of a single cache.
///
/// # Examples
///
/// ```
/// use simcache::config::CommonCacheParams;
///
/// let params = CommonCacheParams::new(1 << 20)
///     .with_per_obj_overhead(32)
///     .with_hashpower(12);
///
/// assert_eq!(params.cache_size(), 1 << 20);
/// assert_eq!(params.per_obj_overhead(), 32);
/// assert_eq!(params.hashpower(), 12);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CommonCacheParams {
    /// Capacity in bytes, including per-object overhead.
    cache_size: u64,

    /// Bytes charged for each cached object on top of its size.
    per_obj_overhead: u64,

    /// log2 of the index bucket count.
    hashpower: u32,
}

impl CommonCacheParams {
    /// Creates parameters for a cache of `cache_size` bytes with no per-object
    /// overhead and the default hashpower.
    pub fn new(cache_size: u64) -> Self {
        Self {
            cache_size,
            per_obj_overhead: 0,
            hashpower: DEFAULT_HASHPOWER,
        }
    }

    /// Sets the bytes charged per object on top of its size.
    #[must_use]
    pub fn with_per_obj_overhead(mut self, per_obj_overhead: u64) -> Self {
        self.per_obj_overhead = per_obj_overhead;
        self
    }

    /// Sets log2 of the index bucket count.
    #[must_use]
    pub fn with_hashpower(mut self, hashpower: u32) -> Self {
        self.hashpower = hashpower;
        self
    }

    /// Sets the capacity in bytes.
    #[must_use]
    pub fn with_cache_size(mut self, cache_size: u64) -> Self {
        self.cache_size = cache_size;
        self
    }

    /// Returns the capacity in bytes.
    pub fn cache_size(&self) -> u64 {
        self.cache_size
    }

    /// Returns the bytes charged per object.
    pub fn per_obj_overhead(&self) -> u64 {
        self.per_obj_overhead
    }

    /// Returns log2 of the index bucket count.
    pub fn hashpower(&self) -> u32 {
        self.hashpower
    }

    /// Checks that every parameter is in range.
    pub fn validate(&self) -> CacheResult<()> {
        if self.cache_size == 0 {
            return Err(CacheError::InvalidConfig(
                "cache_size must be at least 1 byte".to_string(),
            ));
        }
        if self.hashpower > MAX_HASHPOWER {
            return Err(CacheError::InvalidConfig(format!(
                "hashpower {} exceeds the maximum of {MAX_HASHPOWER}",
                self.hashpower
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for CommonCacheParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommonCacheParams")
            .field("cache_size", &self.cache_size)
            .field("per_obj_overhead", &self.per_obj_overhead)
            .field("hashpower", &self.hashpower)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = CommonCacheParams::new(100);
        assert_eq!(params.cache_size(), 100);
        assert_eq!(params.per_obj_overhead(), 0);
        assert_eq!(params.hashpower(), DEFAULT_HASHPOWER);
    }

    #[test]
    fn test_builder_overrides() {
        let params = CommonCacheParams::new(100)
            .with_cache_size(200)
            .with_per_obj_overhead(8)
            .with_hashpower(4);
        assert_eq!(params.cache_size(), 200);
        assert_eq!(params.per_obj_overhead(), 8);
        assert_eq!(params.hashpower(), 4);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert!(CommonCacheParams::new(0).validate().is_err());
        assert!(CommonCacheParams::new(10)
            .with_hashpower(MAX_HASHPOWER + 1)
            .validate()
            .is_err());
        assert!(CommonCacheParams::new(10)
            .with_hashpower(MAX_HASHPOWER)
            .validate()
            .is_ok());
    }
}
