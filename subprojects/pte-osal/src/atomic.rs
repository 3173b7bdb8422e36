//! Interrupt-masked atomics
//!
//! Every operation masks interrupts, performs a plain read-modify-write and restores the
//! previous interrupt state. This is only atomic on a single core, where nothing can run
//! while interrupts are masked.

use core::cell::UnsafeCell;

use pte_svc::interrupts;

fn masked<R>(op: impl FnOnce() -> R) -> R {
    let state = interrupts::disable();
    let res = op();
    interrupts::restore(state);
    res
}

/// Stores `value` into `target` and returns the previous value.
///
/// # Safety
/// * `target` must be valid for reads and writes and properly aligned.
/// * Every concurrent access to `*target` must go through this module.
pub unsafe fn exchange(target: *mut i32, value: i32) -> i32 {
    // SAFETY: upheld by the caller
    masked(|| unsafe { target.replace(value) })
}

/// Stores `exchange` into `dest` if it currently holds `comparand`. Returns the value held
/// before the call in either case.
///
/// # Safety
/// Same contract as [`exchange`].
pub unsafe fn compare_exchange(dest: *mut i32, exchange: i32, comparand: i32) -> i32 {
    masked(|| {
        // SAFETY: upheld by the caller
        let prev = unsafe { dest.read() };
        if prev == comparand {
            unsafe { dest.write(exchange) };
        }
        prev
    })
}

/// Adds `value` to `addend`, wrapping on overflow, and returns the previous value.
///
/// # Safety
/// Same contract as [`exchange`].
pub unsafe fn exchange_add(addend: *mut i32, value: i32) -> i32 {
    masked(|| {
        // SAFETY: upheld by the caller
        let prev = unsafe { addend.read() };
        unsafe { addend.write(prev.wrapping_add(value)) };
        prev
    })
}

/// Increments `dest`, wrapping on overflow, and returns the new value.
///
/// # Safety
/// Same contract as [`exchange`].
pub unsafe fn increment(dest: *mut i32) -> i32 {
    // SAFETY: upheld by the caller
    unsafe { exchange_add(dest, 1) }.wrapping_add(1)
}

/// Decrements `dest`, wrapping on overflow, and returns the new value.
///
/// # Safety
/// Same contract as [`exchange`].
pub unsafe fn decrement(dest: *mut i32) -> i32 {
    // SAFETY: upheld by the caller
    unsafe { exchange_add(dest, -1) }.wrapping_sub(1)
}

/// An `i32` shared between threads through the masked operations of this module.
#[derive(Debug, Default)]
#[repr(transparent)]
pub struct SharedInt(UnsafeCell<i32>);

// SAFETY: every access to the inner value happens with interrupts masked
unsafe impl Sync for SharedInt {}

impl SharedInt {
    pub const fn new(value: i32) -> Self {
        Self(UnsafeCell::new(value))
    }

    /// Returns the current value.
    pub fn get(&self) -> i32 {
        // SAFETY: the pointer comes from a live cell
        masked(|| unsafe { self.0.get().read() })
    }

    /// See [`exchange`].
    pub fn exchange(&self, value: i32) -> i32 {
        // SAFETY: the pointer comes from a live cell
        unsafe { exchange(self.0.get(), value) }
    }

    /// See [`compare_exchange`].
    pub fn compare_exchange(&self, exchange: i32, comparand: i32) -> i32 {
        // SAFETY: the pointer comes from a live cell
        unsafe { compare_exchange(self.0.get(), exchange, comparand) }
    }

    /// See [`exchange_add`].
    pub fn exchange_add(&self, value: i32) -> i32 {
        // SAFETY: the pointer comes from a live cell
        unsafe { exchange_add(self.0.get(), value) }
    }

    /// See [`increment`].
    pub fn increment(&self) -> i32 {
        // SAFETY: the pointer comes from a live cell
        unsafe { increment(self.0.get()) }
    }

    /// See [`decrement`].
    pub fn decrement(&self) -> i32 {
        // SAFETY: the pointer comes from a live cell
        unsafe { decrement(self.0.get()) }
    }

    /// Returns a raw pointer to the value, for the unsafe functions of this module.
    pub const fn as_ptr(&self) -> *mut i32 {
        self.0.get()
    }
}
