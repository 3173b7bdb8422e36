use std::{cell::UnsafeCell, ffi::c_void};

use pte_osal::{
    atomic::SharedInt,
    mutex::{self, MutexHandle},
    thread::{self, ThreadHandle},
};

mod common;

const ROUNDS: u32 = 2000;

struct LockedCounter {
    mutex: MutexHandle,
    value: UnsafeCell<u32>,
}

unsafe extern "C-unwind" fn count_under_mutex(argv: *mut c_void) -> i32 {
    // SAFETY: the test passes a counter that outlives the thread
    let counter = unsafe { &*argv.cast::<LockedCounter>() };
    for _ in 0..ROUNDS {
        mutex::lock(counter.mutex).unwrap();
        // SAFETY: the mutex serializes every access to the value
        unsafe { *counter.value.get() += 1 };
        mutex::unlock(counter.mutex).unwrap();
    }
    0
}

unsafe extern "C-unwind" fn increment_shared(argv: *mut c_void) -> i32 {
    // SAFETY: the test passes a value that outlives the thread
    let value = unsafe { &*argv.cast::<SharedInt>() };
    for _ in 0..ROUNDS {
        value.increment();
    }
    0
}

unsafe extern "C-unwind" fn decrement_shared(argv: *mut c_void) -> i32 {
    // SAFETY: the test passes a value that outlives the thread
    let value = unsafe { &*argv.cast::<SharedInt>() };
    for _ in 0..ROUNDS {
        value.decrement();
    }
    0
}

fn spawn(entry: thread::ThreadEntryPoint, argv: *mut c_void) -> ThreadHandle {
    let th = thread::create(entry, 0x4000, thread::default_priority(), argv).unwrap();
    thread::start(th).unwrap();
    th
}

fn join(th: ThreadHandle) {
    thread::wait_for_end(th).unwrap();
    assert_eq!(common::exit_status(th), Some(0));
    thread::delete(th).unwrap();
}

#[test]
fn mutex_serializes_two_threads() {
    pte_osal::init().unwrap();

    let counter = LockedCounter {
        mutex: mutex::create().unwrap(),
        value: UnsafeCell::new(0),
    };
    let argv = (&raw const counter).cast_mut().cast();

    let a = spawn(count_under_mutex, argv);
    let b = spawn(count_under_mutex, argv);
    join(a);
    join(b);

    assert_eq!(counter.value.into_inner(), 2 * ROUNDS);
    mutex::delete(counter.mutex).unwrap();
}

#[test]
fn masked_atomics_do_not_lose_updates() {
    pte_osal::init().unwrap();

    let value = SharedInt::new(10);
    let argv = (&raw const value).cast_mut().cast();

    let threads = [
        spawn(increment_shared, argv),
        spawn(increment_shared, argv),
        spawn(decrement_shared, argv),
    ];
    for th in threads {
        join(th);
    }

    assert_eq!(value.get(), 10 + ROUNDS as i32);
}

