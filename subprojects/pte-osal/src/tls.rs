//! Thread-local storage for the calling thread
//!
//! The calling thread's table is the one bound to its kernel UID, or the ambient table for
//! a thread not created by [`crate::thread::create`].

use core::ffi::c_void;

use pte_svc::thread as svc;
use pte_sys_tls::{SlotKey, TableId};

use crate::{OsError, Result, init};

/// Allocates a TLS key. Its slot reads as null in every table until set.
pub fn alloc() -> Result<SlotKey> {
    init::control_key()?;
    Ok(pte_sys_tls::key_alloc()?)
}

/// Frees a TLS key. The key reserved for control blocks cannot be freed.
pub fn free(key: SlotKey) -> Result<()> {
    if key == init::control_key()? {
        return Err(OsError::InvalidParam);
    }
    Ok(pte_sys_tls::key_free(key)?)
}

/// Stores `value` under `key` for the calling thread.
///
/// The key reserved for control blocks is read-only.
pub fn set_value(key: SlotKey, value: *mut c_void) -> Result<()> {
    if key == init::control_key()? {
        return Err(OsError::InvalidParam);
    }
    Ok(pte_sys_tls::set_value(current_table()?, key, value)?)
}

/// Reads the value stored under `key` for the calling thread; null if never set.
pub fn get_value(key: SlotKey) -> Result<*mut c_void> {
    Ok(pte_sys_tls::get_value(current_table()?, key)?)
}

fn current_table() -> Result<TableId> {
    Ok(pte_sys_tls::resolve(svc::current().to_raw())?)
}
