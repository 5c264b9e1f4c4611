//! Fixed pool of read/write locks selected by hash.
//!
//! ```text
//!   LockPool (count = 4)         hash & locks_mask
//!   ┌──────────────┐
//!   │ RwLock<T> 0  │ ◀── 0b..00
//!   │ RwLock<T> 1  │ ◀── 0b..01
//!   │ RwLock<T> 2  │ ◀── 0b..10
//!   │ RwLock<T> 3  │ ◀── 0b..11
//!   └──────────────┘
//! ```
//!
//! Each lock owns the data of its stripe, so a reader or writer can only reach
//! that data while holding the right lock.

use crate::error::{fatal, CacheError, CacheResult};
use core::fmt;
use core::mem;
use parking_lot::RwLock;

/// A power-of-two array of `parking_lot::RwLock`s.
pub struct LockPool<T> {
    locks_mask: u64,
    locks: Box<[RwLock<T>]>,
}

impl<T> LockPool<T> {
    /// Allocates `2^locks_power` locks, building each stripe's data with `init`.
    ///
    /// `locks_power == 0` yields a single lock.
    pub fn try_new(
        locks_power: u32,
        mut init: impl FnMut(usize) -> CacheResult<T>,
    ) -> CacheResult<Self> {
        if locks_power >= usize::BITS - 1 {
            return Err(CacheError::InvalidConfig(format!(
                "lock pool power {locks_power} is too large"
            )));
        }
        let count = 1usize << locks_power;

        let mut locks = Vec::new();
        locks
            .try_reserve_exact(count)
            .map_err(|_| CacheError::AllocFailed {
                what: "lock pool",
                bytes: count.saturating_mul(mem::size_of::<RwLock<T>>()),
            })?;
        for stripe in 0..count {
            locks.push(RwLock::new(init(stripe)?));
        }

        Ok(Self {
            locks_mask: (count - 1) as u64,
            locks: locks.into_boxed_slice(),
        })
    }

    /// Like [`try_new`](Self::try_new), but allocation failure terminates the
    /// process.
    pub fn new(locks_power: u32, mut init: impl FnMut(usize) -> T) -> Self {
        Self::try_new(locks_power, |stripe| Ok(init(stripe))).unwrap_or_else(|err| fatal(err))
    }

    /// Returns the stripe index for `hash`.
    #[inline]
    pub fn stripe_of(&self, hash: u64) -> usize {
        (hash & self.locks_mask) as usize
    }

    /// Returns the lock guarding `hash`'s stripe.
    #[inline]
    pub fn get(&self, hash: u64) -> &RwLock<T> {
        &self.locks[self.stripe_of(hash)]
    }

    /// Returns the number of locks.
    #[inline]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Always `false`; a pool holds at least one lock.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    /// Returns log2 of the number of locks.
    #[inline]
    pub fn locks_power(&self) -> u32 {
        self.locks.len().trailing_zeros()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &RwLock<T>> {
        self.locks.iter()
    }
}

impl<T> fmt::Debug for LockPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockPool")
            .field("locks", &self.locks.len())
            .field("locks_mask", &format_args!("{:#x}", self.locks_mask))
            .finish()
    }
}
