use core::{
    ffi::{c_uint, c_void},
    ptr,
};

use pte_sys_tls::SlotKey;

use crate::{OsError, OsStatus, tls};

#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osTlsSetValue(key: c_uint, value: *mut c_void) -> OsStatus {
    tls::set_value(SlotKey::from_raw(key), value).into()
}

/// Returns the calling thread's value for `key`, or null if unset or `key` is invalid.
#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osTlsGetValue(key: c_uint) -> *mut c_void {
    tls::get_value(SlotKey::from_raw(key)).unwrap_or(ptr::null_mut())
}

/// # Safety
/// `key` must be valid for writes.
#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osTlsAlloc(key: *mut c_uint) -> OsStatus {
    if key.is_null() {
        return OsError::InvalidParam.into();
    }

    match tls::alloc() {
        Ok(allocated) => {
            // SAFETY: checked non-null above, validity upheld by the caller
            unsafe { key.write(allocated.to_raw()) };
            OsStatus::Ok
        }
        Err(err) => err.into(),
    }
}

#[unsafe(no_mangle)]
unsafe extern "C" fn pte_osTlsFree(key: c_uint) -> OsStatus {
    tls::free(SlotKey::from_raw(key)).into()
}
