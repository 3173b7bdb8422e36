use core::{
    ffi::c_void,
    ptr,
    sync::atomic::{AtomicPtr, Ordering},
};

use crate::{MAX_SLOTS, key::SlotKey};

/// Per-thread array of TLS slots.
///
/// A slot is written by its own thread and may be reset to null concurrently by a key
/// allocation on another thread, hence the atomics.
pub(crate) struct SlotTable {
    slots: [AtomicPtr<c_void>; MAX_SLOTS],
}

impl SlotTable {
    /// Creates a table with every slot empty.
    pub(crate) const fn new() -> Self {
        Self {
            slots: [const { AtomicPtr::new(ptr::null_mut()) }; MAX_SLOTS],
        }
    }

    /// Reads the slot named by `key`.
    #[inline]
    pub(crate) fn get(&self, key: SlotKey) -> *mut c_void {
        self.slots[key.index()].load(Ordering::Acquire)
    }

    /// Writes the slot named by `key`.
    #[inline]
    pub(crate) fn set(&self, key: SlotKey, value: *mut c_void) {
        self.slots[key.index()].store(value, Ordering::Release);
    }

    /// Resets the slot named by `key` to null.
    #[inline]
    pub(crate) fn clear(&self, key: SlotKey) {
        self.set(key, ptr::null_mut());
    }
}

impl Default for SlotTable {
    fn default() -> Self {
        Self::new()
    }
}
