#![allow(dead_code)]

use std::time::{Duration, Instant};

use pte_osal::thread::ThreadHandle;
use pte_svc::thread as svc;

/// Returns the kernel-side description of an OSAL thread.
pub fn kernel_info(handle: ThreadHandle) -> Option<svc::ThreadInfo> {
    svc::refer_status(svc::Handle::from_raw(handle.to_raw())).ok()
}

/// Returns the exit status of a stopped OSAL thread.
pub fn exit_status(handle: ThreadHandle) -> Option<i32> {
    kernel_info(handle)?.exit_status
}

/// Polls `cond` every millisecond, panicking after five seconds.
pub fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let start = Instant::now();
    while !cond() {
        assert!(start.elapsed() < Duration::from_secs(5), "timed out waiting for {what}");
        std::thread::sleep(Duration::from_millis(1));
    }
}
