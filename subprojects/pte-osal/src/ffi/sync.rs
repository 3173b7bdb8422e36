use core::{
    ffi::{c_int, c_uint},
    time::Duration,
};

use pte_svc::Uid;

use super::timeout_from_ms;
use crate::{
    OsError, OsStatus,
    mutex::{self, MutexHandle},
    semaphore::{self, SemaphoreHandle},
};

/// # Safety
/// `handle` must be valid for writes.
#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osMutexCreate(handle: *mut Uid) -> OsStatus {
    if handle.is_null() {
        return OsError::InvalidParam.into();
    }

    match mutex::create() {
        Ok(created) => {
            // SAFETY: checked non-null above, validity upheld by the caller
            unsafe { handle.write(created.to_raw()) };
            OsStatus::Ok
        }
        Err(err) => err.into(),
    }
}

#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osMutexDelete(handle: Uid) -> OsStatus {
    mutex::delete(MutexHandle::from_raw(handle)).into()
}

#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osMutexLock(handle: Uid) -> OsStatus {
    mutex::lock(MutexHandle::from_raw(handle)).into()
}

#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osMutexTimedLock(handle: Uid, timeout_ms: c_uint) -> OsStatus {
    let timeout = Duration::from_millis(u64::from(timeout_ms));
    mutex::timed_lock(MutexHandle::from_raw(handle), timeout).into()
}

#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osMutexUnlock(handle: Uid) -> OsStatus {
    mutex::unlock(MutexHandle::from_raw(handle)).into()
}

/// # Safety
/// `handle` must be valid for writes.
#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osSemaphoreCreate(initial: c_int, handle: *mut Uid) -> OsStatus {
    if handle.is_null() {
        return OsError::InvalidParam.into();
    }

    match semaphore::create(initial) {
        Ok(created) => {
            // SAFETY: checked non-null above, validity upheld by the caller
            unsafe { handle.write(created.to_raw()) };
            OsStatus::Ok
        }
        Err(err) => err.into(),
    }
}

#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osSemaphoreDelete(handle: Uid) -> OsStatus {
    semaphore::delete(SemaphoreHandle::from_raw(handle)).into()
}

#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osSemaphorePost(handle: Uid, count: c_int) -> OsStatus {
    semaphore::post(SemaphoreHandle::from_raw(handle), count).into()
}

/// # Safety
/// `timeout_ms` must be null or valid for reads.
#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osSemaphorePend(handle: Uid, timeout_ms: *const c_uint) -> OsStatus {
    // SAFETY: upheld by the caller
    let timeout = unsafe { timeout_from_ms(timeout_ms) };
    semaphore::pend(SemaphoreHandle::from_raw(handle), timeout).into()
}

/// # Safety
/// `timeout_ms` must be null or valid for reads.
#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osSemaphoreCancellablePend(
    handle: Uid,
    timeout_ms: *const c_uint,
) -> OsStatus {
    // SAFETY: upheld by the caller
    let timeout = unsafe { timeout_from_ms(timeout_ms) };
    semaphore::cancellable_pend(SemaphoreHandle::from_raw(handle), timeout).into()
}
