//! Process-wide TLS key pool.
//!
//! Keys are bits of a single atomic mask. Allocation claims the lowest clear bit below
//! the pool limit with a CAS loop, freeing clears it again, so neither operation takes a
//! lock.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::{MAX_SLOTS, TlsError, arena};

static POOL: KeyPool = KeyPool::new();

/// Index of a TLS slot, valid in every slot table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct SlotKey(u32);

impl SlotKey {
    /// Converts a raw slot index to a [`SlotKey`].
    ///
    /// The index is not checked here; using a key that was not returned by [`key_alloc`]
    /// fails with [`TlsError::InvalidKey`].
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Converts the [`SlotKey`] to a raw slot index.
    pub const fn to_raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Allocates a key and resets its slot in every live table.
pub fn key_alloc() -> Result<SlotKey, TlsError> {
    let key = POOL.alloc()?;
    arena::clear_slot(key);
    Ok(key)
}

/// Returns `key` to the pool. Values stored under it are left in place until the key is
/// handed out again.
pub fn key_free(key: SlotKey) -> Result<(), TlsError> {
    POOL.free(key)
}

/// Returns the number of keys the pool hands out, `0` before [`crate::global_init`].
pub fn key_limit() -> u32 {
    POOL.limit()
}

/// Sets the pool limit, clamped to [`MAX_SLOTS`].
pub(crate) fn set_limit(max_slots: u32) {
    POOL.set_limit(max_slots);
}

/// Fails unless `key` is currently allocated.
pub(crate) fn check(key: SlotKey) -> Result<(), TlsError> {
    if POOL.is_allocated(key) {
        Ok(())
    } else {
        Err(TlsError::InvalidKey(key.0))
    }
}

struct KeyPool {
    used: AtomicU32,
    limit: AtomicU32,
}

impl KeyPool {
    const fn new() -> Self {
        Self {
            used: AtomicU32::new(0),
            limit: AtomicU32::new(0),
        }
    }

    fn limit(&self) -> u32 {
        self.limit.load(Ordering::Acquire)
    }

    fn set_limit(&self, max_slots: u32) {
        self.limit
            .store(max_slots.min(MAX_SLOTS as u32), Ordering::Release);
    }

    /// Bitmask with the lowest `limit` bits set.
    fn valid_mask(&self) -> u32 {
        match self.limit() {
            limit if limit >= u32::BITS => u32::MAX,
            limit => (1u32 << limit) - 1,
        }
    }

    fn alloc(&self) -> Result<SlotKey, TlsError> {
        if self.limit() == 0 {
            return Err(TlsError::NotInitialized);
        }

        let valid_mask = self.valid_mask();
        let mut current = self.used.load(Ordering::Acquire);
        loop {
            let free = !current & valid_mask;
            if free == 0 {
                return Err(TlsError::NoFreeKeys);
            }

            let bit = free.trailing_zeros();
            match self.used.compare_exchange_weak(
                current,
                current | (1 << bit),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(SlotKey(bit)),
                Err(actual) => current = actual,
            }
        }
    }

    fn free(&self, key: SlotKey) -> Result<(), TlsError> {
        if key.0 >= self.limit() {
            return Err(TlsError::InvalidKey(key.0));
        }

        let bit = 1u32 << key.0;
        let prev = self.used.fetch_and(!bit, Ordering::AcqRel);
        if prev & bit == 0 {
            return Err(TlsError::InvalidKey(key.0));
        }

        Ok(())
    }

    fn is_allocated(&self, key: SlotKey) -> bool {
        key.0 < self.limit() && self.used.load(Ordering::Acquire) & (1 << key.0) != 0
    }
}
