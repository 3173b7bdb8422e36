//! Every function requires its pointer argument to be valid for reads and writes, and
//! every concurrent access to the target to go through these functions.

use core::ffi::c_int;

use crate::atomic;

#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osAtomicExchange(target: *mut c_int, value: c_int) -> c_int {
    // SAFETY: upheld by the caller
    unsafe { atomic::exchange(target, value) }
}

#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osAtomicCompareExchange(
    dest: *mut c_int,
    exchange: c_int,
    comparand: c_int,
) -> c_int {
    // SAFETY: upheld by the caller
    unsafe { atomic::compare_exchange(dest, exchange, comparand) }
}

#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osAtomicExchangeAdd(addend: *mut c_int, value: c_int) -> c_int {
    // SAFETY: upheld by the caller
    unsafe { atomic::exchange_add(addend, value) }
}

#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osAtomicIncrement(dest: *mut c_int) -> c_int {
    // SAFETY: upheld by the caller
    unsafe { atomic::increment(dest) }
}

#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osAtomicDecrement(dest: *mut c_int) -> c_int {
    // SAFETY: upheld by the caller
    unsafe { atomic::decrement(dest) }
}
