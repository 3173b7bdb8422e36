use std::{ffi::c_void, ptr, time::Duration};

use pte_osal::{
    OsError,
    semaphore::{self, SemaphoreHandle},
    thread::{self, ThreadHandle},
};
use pte_svc::thread::ThreadStatus;

mod common;

unsafe extern "C-unwind" fn return_seven(_argv: *mut c_void) -> i32 {
    7
}

unsafe extern "C-unwind" fn exit_early(_argv: *mut c_void) -> i32 {
    thread::exit();
}

unsafe extern "C-unwind" fn exit_and_delete_self(_argv: *mut c_void) -> i32 {
    thread::exit_and_delete(thread::get_handle());
}

unsafe extern "C-unwind" fn exit_and_delete_other(argv: *mut c_void) -> i32 {
    // SAFETY: the test passes a thread handle that outlives the thread
    let other = unsafe { *argv.cast::<ThreadHandle>() };
    thread::exit_and_delete(other);
}

unsafe extern "C-unwind" fn pend_on_argv(argv: *mut c_void) -> i32 {
    // SAFETY: the test passes a semaphore handle that outlives the thread
    let sem = unsafe { *argv.cast::<SemaphoreHandle>() };
    match semaphore::pend(sem, None) {
        Ok(()) => 0,
        Err(_) => 1,
    }
}

fn spawn(entry: thread::ThreadEntryPoint, argv: *mut c_void) -> ThreadHandle {
    let th = thread::create(entry, 0x4000, thread::default_priority(), argv).unwrap();
    thread::start(th).unwrap();
    th
}

#[test]
fn entry_return_value_is_exit_status() {
    pte_osal::init().unwrap();

    let th = spawn(return_seven, ptr::null_mut());
    thread::wait_for_end(th).unwrap();

    assert_eq!(common::exit_status(th), Some(7));
    thread::delete(th).unwrap();
}

#[test]
fn created_thread_stays_dormant_until_started() {
    pte_osal::init().unwrap();

    let th = thread::create(return_seven, 0, thread::default_priority(), ptr::null_mut()).unwrap();
    std::thread::sleep(Duration::from_millis(10));
    assert_eq!(common::kernel_info(th).unwrap().status, ThreadStatus::Dormant);

    // Never started: deleting it is allowed
    thread::delete(th).unwrap();
    assert!(common::kernel_info(th).is_none());
}

#[test]
fn thread_name_carries_sequence_and_table() {
    pte_osal::init().unwrap();

    let th = thread::create(return_seven, 0, thread::default_priority(), ptr::null_mut()).unwrap();
    let name = common::kernel_info(th).unwrap().name;
    let table = pte_sys_tls::binding(th.to_raw()).unwrap();

    let (seq, suffix) = name
        .strip_prefix("pthread")
        .and_then(|rest| rest.split_once("__"))
        .unwrap();
    assert!(seq.len() >= 4 && seq.chars().all(|c| c.is_ascii_digit()), "{name}");
    assert_eq!(suffix, format!("{table:x}"));

    thread::delete(th).unwrap();
}

#[test]
fn stack_size_is_raised_to_minimum() {
    pte_osal::init().unwrap();

    let th = thread::create(return_seven, 16, thread::default_priority(), ptr::null_mut()).unwrap();
    assert_eq!(
        common::kernel_info(th).unwrap().stack_size,
        pte_osal::config::min_stack_size()
    );

    thread::delete(th).unwrap();
}

#[test]
fn exit_stops_thread_and_keeps_resources() {
    pte_osal::init().unwrap();

    let th = spawn(exit_early, ptr::null_mut());
    thread::wait_for_end(th).unwrap();

    assert_eq!(common::exit_status(th), Some(0));
    assert!(pte_sys_tls::binding(th.to_raw()).is_some());

    thread::delete(th).unwrap();
    assert!(pte_sys_tls::binding(th.to_raw()).is_none());
}

#[test]
fn exit_and_delete_removes_thread() {
    pte_osal::init().unwrap();

    let th = spawn(exit_and_delete_self, ptr::null_mut());
    common::wait_until("thread deletion", || common::kernel_info(th).is_none());

    assert!(pte_sys_tls::binding(th.to_raw()).is_none());
    assert_eq!(thread::delete(th), Err(OsError::GeneralFailure));
}

#[test]
fn exit_and_delete_terminates_caller_when_other_is_busy() {
    pte_osal::init().unwrap();

    let mut sem = semaphore::create(0).unwrap();
    let mut busy = spawn(pend_on_argv, (&raw mut sem).cast());
    common::wait_until("thread start", || {
        common::kernel_info(busy).unwrap().status == ThreadStatus::Running
    });

    let th = spawn(exit_and_delete_other, (&raw mut busy).cast());
    common::wait_until("thread deletion", || common::kernel_info(th).is_none());

    // The busy thread could not be deleted and keeps its resources
    assert!(pte_sys_tls::binding(busy.to_raw()).is_some());
    assert_eq!(thread::check_cancel(busy), Ok(()));

    semaphore::post(sem, 1).unwrap();
    thread::wait_for_end(busy).unwrap();
    thread::delete(busy).unwrap();
    semaphore::delete(sem).unwrap();
}

#[test]
fn running_thread_cannot_be_deleted() {
    pte_osal::init().unwrap();

    let mut sem = semaphore::create(0).unwrap();
    let th = spawn(pend_on_argv, (&raw mut sem).cast());
    common::wait_until("thread start", || {
        common::kernel_info(th).unwrap().status == ThreadStatus::Running
    });

    assert_eq!(thread::delete(th), Err(OsError::GeneralFailure));
    assert!(pte_sys_tls::binding(th.to_raw()).is_some());

    semaphore::post(sem, 1).unwrap();
    thread::wait_for_end(th).unwrap();
    assert_eq!(common::exit_status(th), Some(0));

    thread::delete(th).unwrap();
    semaphore::delete(sem).unwrap();
}

#[test]
fn unmanaged_thread_cannot_be_deleted() {
    pte_osal::init().unwrap();

    assert_eq!(
        thread::delete(thread::get_handle()),
        Err(OsError::GeneralFailure)
    );
}

#[test]
fn priority_round_trips_through_kernel() {
    pte_osal::init().unwrap();

    let th = thread::create(return_seven, 0, thread::min_priority(), ptr::null_mut()).unwrap();
    assert_eq!(thread::get_priority(th), Ok(thread::min_priority()));

    thread::set_priority(th, thread::max_priority()).unwrap();
    assert_eq!(thread::get_priority(th), Ok(thread::max_priority()));

    assert_eq!(thread::set_priority(th, 0), Err(OsError::InvalidParam));

    thread::delete(th).unwrap();
}

#[test]
fn priority_constants() {
    assert_eq!(thread::min_priority(), 17);
    assert_eq!(thread::max_priority(), 30);
    assert_eq!(thread::default_priority(), 18);
    assert!(thread::max_priority() > thread::min_priority());
    assert!(
        pte_svc::thread::PRIORITY_LOWEST <= thread::min_priority()
            && thread::max_priority() <= pte_svc::thread::PRIORITY_HIGHEST
    );
}

#[test]
fn sleep_waits_at_least_requested_time() {
    let start = std::time::Instant::now();
    thread::sleep(15);
    assert!(start.elapsed() >= Duration::from_millis(15));
}
