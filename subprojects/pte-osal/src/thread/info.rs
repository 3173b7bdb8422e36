use pte_svc::thread as svc;

use super::ThreadHandle;
use crate::Result;

/// Least urgent priority handed to the threading library.
pub const MIN_PRIORITY: i32 = 17;

/// Most urgent priority handed to the threading library.
pub const MAX_PRIORITY: i32 = 30;

/// Priority of threads created without an explicit one.
pub const DEFAULT_PRIORITY: i32 = 18;

static_assertions::const_assert!(MIN_PRIORITY <= DEFAULT_PRIORITY);
static_assertions::const_assert!(DEFAULT_PRIORITY <= MAX_PRIORITY);
static_assertions::const_assert!(
    svc::PRIORITY_LOWEST <= MIN_PRIORITY && MAX_PRIORITY <= svc::PRIORITY_HIGHEST
);

/// Returns the handle of the calling thread.
pub fn get_handle() -> ThreadHandle {
    ThreadHandle(svc::current())
}

/// Returns the current priority of a thread.
pub fn get_priority(handle: ThreadHandle) -> Result<i32> {
    Ok(svc::refer_status(handle.0)?.current_priority)
}

/// Changes the priority of a thread.
pub fn set_priority(handle: ThreadHandle, priority: i32) -> Result<()> {
    svc::change_priority(handle.0, priority)?;
    Ok(())
}

pub const fn min_priority() -> i32 {
    MIN_PRIORITY
}

pub const fn max_priority() -> i32 {
    MAX_PRIORITY
}

pub const fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}
