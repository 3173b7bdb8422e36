use std::{ffi::c_void, ptr};

use pte_osal::{
    OsError,
    thread::{self, ThreadHandle},
    tls,
};
use pte_sys_tls::SlotKey;

mod common;

struct Probe {
    key: SlotKey,
    marker: u8,
}

/// Stores a pointer to its own marker, lets the other thread do the same, then checks
/// the slot still holds its own value.
unsafe extern "C-unwind" fn store_and_check(argv: *mut c_void) -> i32 {
    // SAFETY: the test passes a probe that outlives the thread
    let probe = unsafe { &*argv.cast::<Probe>() };
    let mine = (&raw const probe.marker).cast_mut().cast::<c_void>();

    if tls::get_value(probe.key) != Ok(ptr::null_mut()) {
        return 1;
    }
    tls::set_value(probe.key, mine).unwrap();
    thread::sleep(20);

    if tls::get_value(probe.key) == Ok(mine) { 0 } else { 2 }
}

fn spawn(entry: thread::ThreadEntryPoint, argv: *mut c_void) -> ThreadHandle {
    let th = thread::create(entry, 0x4000, thread::default_priority(), argv).unwrap();
    thread::start(th).unwrap();
    th
}

#[test]
fn managed_threads_have_isolated_slots() {
    pte_osal::init().unwrap();
    let key = tls::alloc().unwrap();

    let a = Probe { key, marker: 1 };
    let b = Probe { key, marker: 2 };
    let ta = spawn(store_and_check, (&raw const a).cast_mut().cast());
    let tb = spawn(store_and_check, (&raw const b).cast_mut().cast());

    for th in [ta, tb] {
        thread::wait_for_end(th).unwrap();
        assert_eq!(common::exit_status(th), Some(0));
        thread::delete(th).unwrap();
    }

    // Nothing leaked into the ambient table
    assert_eq!(tls::get_value(key), Ok(ptr::null_mut()));
    tls::free(key).unwrap();
}

#[test]
fn ambient_thread_uses_tls_without_create() {
    pte_osal::init().unwrap();
    let key = tls::alloc().unwrap();
    let mut value = 42u32;

    assert_eq!(tls::get_value(key), Ok(ptr::null_mut()));
    tls::set_value(key, (&raw mut value).cast()).unwrap();
    assert_eq!(tls::get_value(key), Ok((&raw mut value).cast()));

    tls::set_value(key, ptr::null_mut()).unwrap();
    tls::free(key).unwrap();
}

#[test]
fn freed_key_is_rejected() {
    pte_osal::init().unwrap();
    let key = tls::alloc().unwrap();
    tls::free(key).unwrap();

    assert_eq!(tls::free(key), Err(OsError::InvalidParam));
    assert_eq!(
        tls::set_value(SlotKey::from_raw(99), ptr::null_mut()),
        Err(OsError::InvalidParam)
    );
}

#[test]
fn control_block_key_is_reserved() {
    pte_osal::init().unwrap();

    // The first key handed out at init holds the control blocks
    let reserved = SlotKey::from_raw(0);
    assert_eq!(tls::free(reserved), Err(OsError::InvalidParam));
    assert_eq!(
        tls::set_value(reserved, ptr::null_mut()),
        Err(OsError::InvalidParam)
    );
    assert!(!tls::get_value(reserved).unwrap().is_null());
}
