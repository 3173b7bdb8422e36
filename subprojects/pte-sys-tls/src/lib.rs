//! # pte-sys-tls
//!
//! Thread-local storage emulation for a kernel that has none.
//!
//! Every managed thread owns a slot table of [`MAX_SLOTS`] pointer-sized slots. Slot
//! indices are handed out process-wide as [`SlotKey`]s, so the same key names the same
//! slot in every table. Tables live in an arena and are addressed by a stable [`TableId`];
//! the arena also keeps the binding from a kernel thread UID to the table of that thread.
//!
//! Threads that were never bound to a table (the process' main thread, or any other thread
//! not created through the OSAL) all resolve to a single *ambient* table created by
//! [`global_init`] and never destroyed. The ambient table is therefore shared by every
//! unmanaged thread; only one such thread is expected to use TLS.
//!
//! Allocating a key resets the slot to null in every live table, so a recycled key never
//! exposes the value stored under its previous owner.
//!
//! Only `core` and `alloc` are used here; `std` comes in through [`pte_svc`].

#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod arena;
mod key;
mod table;

pub use arena::{
    TableId, ambient_table, bind, binding, global_init, live_tables, resolve, thread_destroy,
    thread_init, unbind,
};
pub use key::{SlotKey, key_alloc, key_free, key_limit};

use core::ffi::c_void;

/// Number of slots in every table.
pub const MAX_SLOTS: usize = 32;

static_assertions::const_assert!(MAX_SLOTS <= u32::BITS as usize);

/// Stores `value` under `key` in `table`.
pub fn set_value(table: TableId, key: SlotKey, value: *mut c_void) -> Result<(), TlsError> {
    key::check(key)?;
    arena::table(table)?.set(key, value);
    Ok(())
}

/// Reads the value stored under `key` in `table`. A slot never written reads as null.
pub fn get_value(table: TableId, key: SlotKey) -> Result<*mut c_void, TlsError> {
    key::check(key)?;
    Ok(arena::table(table)?.get(key))
}

/// Error type for TLS operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TlsError {
    /// Every key of the pool is allocated.
    #[error("No free TLS keys")]
    NoFreeKeys,
    /// The key is out of range or not allocated.
    #[error("Invalid TLS key: {0}")]
    InvalidKey(u32),
    /// [`global_init`] was not called yet.
    #[error("TLS not initialized")]
    NotInitialized,
    /// The table id does not name a live table, or names the ambient table where a managed
    /// table is required.
    #[error("Invalid TLS table")]
    InvalidTable,
    /// The arena could not grow.
    #[error("Out of memory")]
    OutOfMemory,
}
