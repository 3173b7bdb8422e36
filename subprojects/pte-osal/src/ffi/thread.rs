use core::ffi::{c_int, c_uint, c_void};

use pte_svc::Uid;

use crate::{
    OsError, OsStatus,
    thread::{self, ThreadEntryPoint, ThreadHandle},
};

/// Creates a thread in the *created* state and writes its handle to `handle`.
///
/// A negative `stack_size` is treated as zero and raised to the minimum stack size.
///
/// # Safety
/// * `handle` must be valid for writes.
/// * `entry` must be safe to call with `argv` from another thread.
#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osThreadCreate(
    entry: Option<ThreadEntryPoint>,
    stack_size: c_int,
    priority: c_int,
    argv: *mut c_void,
    handle: *mut Uid,
) -> OsStatus {
    let Some(entry) = entry else {
        return OsError::InvalidParam.into();
    };
    if handle.is_null() {
        return OsError::InvalidParam.into();
    }

    let stack_size = usize::try_from(stack_size).unwrap_or(0);
    match thread::create(entry, stack_size, priority, argv) {
        Ok(created) => {
            // SAFETY: checked non-null above, validity upheld by the caller
            unsafe { handle.write(created.to_raw()) };
            OsStatus::Ok
        }
        Err(err) => err.into(),
    }
}

#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osThreadStart(handle: Uid) -> OsStatus {
    thread::start(ThreadHandle::from_raw(handle)).into()
}

#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osThreadDelete(handle: Uid) -> OsStatus {
    thread::delete(ThreadHandle::from_raw(handle)).into()
}

/// Releases the OSAL resources of `handle`, then terminates and deletes the calling
/// thread. Never returns.
#[unsafe(no_mangle)]
unsafe extern "C-unwind" fn pte_osThreadExitAndDelete(handle: Uid) -> OsStatus {
    thread::exit_and_delete(ThreadHandle::from_raw(handle))
}

/// Terminates the calling thread. Never returns.
#[unsafe(no_mangle)]
unsafe extern "C-unwind" fn pte_osThreadExit() {
    thread::exit()
}

#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osThreadWaitForEnd(handle: Uid) -> OsStatus {
    thread::wait_for_end(ThreadHandle::from_raw(handle)).into()
}

#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osThreadGetHandle() -> Uid {
    thread::get_handle().to_raw()
}

/// Returns the current priority of `handle`, or `0` if the thread does not exist.
#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osThreadGetPriority(handle: Uid) -> c_int {
    thread::get_priority(ThreadHandle::from_raw(handle)).unwrap_or(0)
}

#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osThreadSetPriority(handle: Uid, priority: c_int) -> OsStatus {
    thread::set_priority(ThreadHandle::from_raw(handle), priority).into()
}

#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osThreadSleep(msecs: c_uint) {
    thread::sleep(msecs)
}

#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osThreadGetMinPriority() -> c_int {
    thread::min_priority()
}

#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osThreadGetMaxPriority() -> c_int {
    thread::max_priority()
}

#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osThreadGetDefaultPriority() -> c_int {
    thread::default_priority()
}

#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osThreadCancel(handle: Uid) -> OsStatus {
    thread::cancel(ThreadHandle::from_raw(handle)).into()
}

#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osThreadCheckCancel(handle: Uid) -> OsStatus {
    thread::check_cancel(ThreadHandle::from_raw(handle)).into()
}

#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osThreadClearCancel(handle: Uid) -> OsStatus {
    thread::clear_cancel(ThreadHandle::from_raw(handle)).into()
}
