//! C ABI of the OSAL
//!
//! The `pte_os*` functions expected by the PTE threading library. Handles are raw kernel
//! UIDs, timeouts are pointers to milliseconds (null meaning infinite) and results are
//! [`OsStatus`](crate::OsStatus) codes.

#![allow(non_snake_case)]

mod atomic;
mod sync;
mod thread;
mod tls;

use core::{ffi::c_uint, time::Duration};

use crate::{OsStatus, init};

/// Initializes the OSAL with the default configuration.
#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osInit() -> OsStatus {
    init().into()
}

/// Reads an optional millisecond timeout.
///
/// # Safety
/// `timeout_ms` must be null or valid for reads.
unsafe fn timeout_from_ms(timeout_ms: *const c_uint) -> Option<Duration> {
    // SAFETY: upheld by the caller
    unsafe { timeout_ms.as_ref() }.map(|ms| Duration::from_millis(u64::from(*ms)))
}
