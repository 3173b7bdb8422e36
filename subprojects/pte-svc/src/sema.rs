//! Counting semaphores
//!
//! A semaphore holds a count bounded by `0..=max_count`. Waiting for `n` units blocks
//! until the count is at least `n` and then subtracts it; signalling adds to the count and
//! wakes the waiters. A wait may be given a timeout; a zero timeout turns the wait into a
//! non-blocking poll that fails with [`WaitSemaError::TimedOut`] when the units are not
//! immediately available.
//!
//! Deleting a semaphore wakes every thread blocked on it with
//! [`WaitSemaError::Deleted`].

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex};

use crate::object::{self, Object};

define_handle_type! {
    /// A handle to a counting semaphore kernel object.
    pub struct Handle
}

/// Snapshot of a semaphore's state, as reported by [`refer_status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemaInfo {
    /// Name given at creation.
    pub name: String,
    /// Count given at creation.
    pub init_count: i32,
    /// Number of units currently available.
    pub current_count: i32,
    /// Upper bound of the count.
    pub max_count: i32,
    /// Number of threads blocked in [`wait`].
    pub num_wait_threads: u32,
}

pub(crate) struct SemaObject {
    name: String,
    init_count: i32,
    max_count: i32,
    state: Mutex<SemaState>,
    cond: Condvar,
}

struct SemaState {
    count: i32,
    waiters: u32,
    deleted: bool,
}

/// Creates a semaphore holding `init_count` units, bounded by `max_count`.
pub fn create(name: &str, init_count: i32, max_count: i32) -> Result<Handle, CreateSemaError> {
    if max_count < 1 || init_count < 0 || init_count > max_count {
        return Err(CreateSemaError::IllegalCount);
    }

    let sema = SemaObject {
        name: name.to_owned(),
        init_count,
        max_count,
        state: Mutex::new(SemaState {
            count: init_count,
            waiters: 0,
            deleted: false,
        }),
        cond: Condvar::new(),
    };

    let uid = object::insert(Object::Sema(Arc::new(sema)))
        .map_err(|_| CreateSemaError::OutOfMemory)?;
    Ok(Handle(uid))
}

#[derive(Debug, thiserror::Error)]
pub enum CreateSemaError {
    /// The initial count is negative, the maximum is not positive, or the initial count
    /// exceeds the maximum.
    #[error("Illegal count")]
    IllegalCount,
    /// The kernel object table is exhausted.
    #[error("Out of memory")]
    OutOfMemory,
}

/// Deletes a semaphore, waking every waiter with [`WaitSemaError::Deleted`].
pub fn delete(handle: Handle) -> Result<(), DeleteSemaError> {
    let sema = object::remove_sema(handle.0).ok_or(DeleteSemaError::InvalidHandle)?;

    let mut state = sema.state.lock();
    state.deleted = true;
    sema.cond.notify_all();

    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteSemaError {
    /// The handle does not name a live semaphore.
    #[error("Invalid handle")]
    InvalidHandle,
}

/// Waits until `count` units are available and takes them.
///
/// * `timeout == None` waits forever.
/// * `timeout == Some(Duration::ZERO)` polls: the call never blocks.
/// * Any other timeout bounds the wait; timeouts too large to be represented are treated
///   as infinite.
pub fn wait(handle: Handle, count: i32, timeout: Option<Duration>) -> Result<(), WaitSemaError> {
    let sema = object::get_sema(handle.0).ok_or(WaitSemaError::InvalidHandle)?;
    if count < 1 || count > sema.max_count {
        return Err(WaitSemaError::IllegalCount);
    }

    let deadline = timeout.and_then(|timeout| Instant::now().checked_add(timeout));

    let mut state = sema.state.lock();
    state.waiters += 1;

    let result = loop {
        if state.deleted {
            break Err(WaitSemaError::Deleted);
        }

        if state.count >= count {
            state.count -= count;
            break Ok(());
        }

        match deadline {
            None => sema.cond.wait(&mut state),
            Some(deadline) => {
                if Instant::now() >= deadline {
                    break Err(WaitSemaError::TimedOut);
                }
                // Spurious and early wake-ups are handled by re-checking at the loop head
                let _ = sema.cond.wait_until(&mut state, deadline);
            }
        }
    };

    state.waiters -= 1;
    result
}

#[derive(Debug, thiserror::Error)]
pub enum WaitSemaError {
    /// The handle does not name a live semaphore.
    #[error("Invalid handle")]
    InvalidHandle,
    /// The requested count is not positive or exceeds the semaphore's maximum.
    #[error("Illegal count")]
    IllegalCount,
    /// The units were not available before the timeout expired.
    #[error("Wait timed out")]
    TimedOut,
    /// The semaphore was deleted while the caller was waiting on it.
    #[error("Semaphore deleted while waiting")]
    Deleted,
}

/// Adds `count` units to the semaphore and wakes its waiters.
///
/// Fails with [`SignalSemaError::Overflow`], leaving the count untouched, when the result
/// would exceed the semaphore's maximum.
pub fn signal(handle: Handle, count: i32) -> Result<(), SignalSemaError> {
    let sema = object::get_sema(handle.0).ok_or(SignalSemaError::InvalidHandle)?;
    if count < 1 {
        return Err(SignalSemaError::IllegalCount);
    }

    let mut state = sema.state.lock();
    if state.deleted {
        return Err(SignalSemaError::InvalidHandle);
    }

    match state.count.checked_add(count) {
        Some(new_count) if new_count <= sema.max_count => state.count = new_count,
        _ => return Err(SignalSemaError::Overflow),
    }

    sema.cond.notify_all();
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum SignalSemaError {
    /// The handle does not name a live semaphore.
    #[error("Invalid handle")]
    InvalidHandle,
    /// The count to add is not positive.
    #[error("Illegal count")]
    IllegalCount,
    /// The count would exceed the semaphore's maximum.
    #[error("Semaphore overflow")]
    Overflow,
}

/// Returns a snapshot of the semaphore's state without modifying it.
pub fn refer_status(handle: Handle) -> Result<SemaInfo, ReferSemaError> {
    let sema = object::get_sema(handle.0).ok_or(ReferSemaError::InvalidHandle)?;
    let state = sema.state.lock();

    Ok(SemaInfo {
        name: sema.name.clone(),
        init_count: sema.init_count,
        current_count: state.count,
        max_count: sema.max_count,
        num_wait_threads: state.waiters,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ReferSemaError {
    /// The handle does not name a live semaphore.
    #[error("Invalid handle")]
    InvalidHandle,
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn create_rejects_inconsistent_counts() {
        assert!(matches!(create("bad", 2, 1), Err(CreateSemaError::IllegalCount)));
        assert!(matches!(create("bad", -1, 1), Err(CreateSemaError::IllegalCount)));
        assert!(matches!(create("bad", 0, 0), Err(CreateSemaError::IllegalCount)));
    }

    #[test]
    fn zero_timeout_wait_polls() {
        let sem = create("poll", 1, 1).unwrap();

        assert!(wait(sem, 1, Some(Duration::ZERO)).is_ok());
        assert!(matches!(
            wait(sem, 1, Some(Duration::ZERO)),
            Err(WaitSemaError::TimedOut)
        ));

        delete(sem).unwrap();
    }

    #[test]
    fn signal_past_max_overflows() {
        let sem = create("ovf", 1, 1).unwrap();

        assert!(matches!(signal(sem, 1), Err(SignalSemaError::Overflow)));
        assert_eq!(refer_status(sem).unwrap().current_count, 1);

        delete(sem).unwrap();
    }

    #[test]
    fn signal_wakes_blocked_waiter() {
        let sem = create("wake", 0, 10).unwrap();

        let waiter = thread::spawn(move || wait(sem, 2, None));
        signal(sem, 2).unwrap();

        assert!(waiter.join().unwrap().is_ok());
        assert_eq!(refer_status(sem).unwrap().current_count, 0);

        delete(sem).unwrap();
    }

    #[test]
    fn delete_wakes_waiters() {
        let sem = create("del", 0, 1).unwrap();

        let waiter = thread::spawn(move || wait(sem, 1, None));
        while refer_status(sem).unwrap().num_wait_threads == 0 {
            thread::yield_now();
        }
        delete(sem).unwrap();

        assert!(matches!(waiter.join().unwrap(), Err(WaitSemaError::Deleted)));
        assert!(matches!(refer_status(sem), Err(ReferSemaError::InvalidHandle)));
    }

    #[test]
    fn timed_wait_expires() {
        let sem = create("timed", 0, 1).unwrap();

        let start = Instant::now();
        let res = wait(sem, 1, Some(Duration::from_millis(20)));

        assert!(matches!(res, Err(WaitSemaError::TimedOut)));
        assert!(start.elapsed() >= Duration::from_millis(20));

        delete(sem).unwrap();
    }
}
