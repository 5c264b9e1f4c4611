//! Configuration for the Segmented Least Recently Used (SLRU) cache.

use crate::error::{CacheError, CacheResult};
use core::fmt;

/// Policy parameters of an SLRU cache.
///
/// SLRU divides the cache into `n_seg` equally sized LRU segments. New objects
/// enter segment 0; a hit moves an object one segment up, and objects pushed
/// out of a segment are demoted one segment down.
///
/// # Examples
///
/// ```
/// use simcache::config::SlruParams;
///
/// let params = SlruParams::new(4);
/// assert_eq!(params.n_seg(), 4);
/// assert!(params.validate(1024).is_ok());
/// assert!(params.validate(3).is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SlruParams {
    /// Number of segments.
    n_seg: usize,
}

impl SlruParams {
    /// Creates parameters for an SLRU with `n_seg` segments.
    ///
    /// # Panics
    /// Panics if `n_seg` is zero.
    pub fn new(n_seg: usize) -> Self {
        assert!(n_seg >= 1, "n_seg must be at least 1");
        Self { n_seg }
    }

    /// Returns the number of segments.
    pub fn n_seg(&self) -> usize {
        self.n_seg
    }

    /// Checks the segment count against the total capacity it divides.
    pub fn validate(&self, cache_size: u64) -> CacheResult<()> {
        if self.n_seg == 0 {
            return Err(CacheError::InvalidConfig(
                "n_seg must be at least 1".to_string(),
            ));
        }
        if self.n_seg as u64 > cache_size {
            return Err(CacheError::InvalidConfig(format!(
                "n_seg {} leaves an empty segment in a cache of {cache_size} bytes",
                self.n_seg
            )));
        }
        Ok(())
    }
}

impl Default for SlruParams {
    /// Two segments: probationary and protected.
    fn default() -> Self {
        Self { n_seg: 2 }
    }
}

impl fmt::Debug for SlruParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlruParams")
            .field("n_seg", &self.n_seg)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slru_params_creation() {
        assert_eq!(SlruParams::new(3).n_seg(), 3);
        assert_eq!(SlruParams::default().n_seg(), 2);
    }

    #[test]
    #[should_panic(expected = "n_seg must be at least 1")]
    fn test_zero_segments_panics() {
        SlruParams::new(0);
    }

    #[test]
    fn test_more_segments_than_bytes() {
        let err = SlruParams::new(8).validate(4).unwrap_err();
        assert!(matches!(err, CacheError::InvalidConfig(_)));
        assert!(SlruParams::new(4).validate(4).is_ok());
    }
}
