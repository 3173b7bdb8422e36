//! Mutexes
//!
//! A mutex is a kernel counting semaphore with one unit. There is no owner tracking:
//! unlocking a mutex the caller does not hold is a caller error, and locking it twice from
//! the same thread deadlocks.

use alloc::format;
use core::time::Duration;

use pte_svc::{Uid, sema};

use crate::{OsError, Result, naming};

/// Handle of a mutex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct MutexHandle(sema::Handle);

impl MutexHandle {
    /// Converts a raw kernel UID to a [`MutexHandle`].
    pub const fn from_raw(raw: Uid) -> Self {
        Self(sema::Handle::from_raw(raw))
    }

    /// Converts the [`MutexHandle`] to a raw kernel UID.
    pub const fn to_raw(self) -> Uid {
        self.0.to_raw()
    }
}

/// Creates an unlocked mutex.
pub fn create() -> Result<MutexHandle> {
    let name = format!("mutex{}", naming::MUTEXES.next());
    let handle = sema::create(&name, 1, 1)?;
    Ok(MutexHandle(handle))
}

/// Deletes a mutex. No thread may be waiting on it.
pub fn delete(handle: MutexHandle) -> Result<()> {
    sema::delete(handle.0)?;
    Ok(())
}

/// Locks the mutex, waiting as long as needed.
pub fn lock(handle: MutexHandle) -> Result<()> {
    sema::wait(handle.0, 1, None)?;
    Ok(())
}

/// Locks the mutex, waiting at most `timeout`.
///
/// Every failure is reported as [`OsError::Timeout`]; failures other than a timeout are
/// logged.
pub fn timed_lock(handle: MutexHandle, timeout: Duration) -> Result<()> {
    match sema::wait(handle.0, 1, Some(timeout)) {
        Ok(()) => Ok(()),
        Err(sema::WaitSemaError::TimedOut) => Err(OsError::Timeout),
        Err(err) => {
            log::warn!("osal: timed lock on mutex {} failed: {err}", handle.0);
            Err(OsError::Timeout)
        }
    }
}

/// Unlocks the mutex.
pub fn unlock(handle: MutexHandle) -> Result<()> {
    sema::signal(handle.0, 1).map_err(|err| {
        log::warn!("osal: cannot unlock mutex {}: {err}", handle.0);
        OsError::GeneralFailure
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_excludes_second_locker() {
        let mutex = create().unwrap();

        lock(mutex).unwrap();
        assert_eq!(
            timed_lock(mutex, Duration::from_millis(5)),
            Err(OsError::Timeout)
        );

        unlock(mutex).unwrap();
        timed_lock(mutex, Duration::from_millis(5)).unwrap();
        unlock(mutex).unwrap();

        delete(mutex).unwrap();
    }

    #[test]
    fn double_unlock_fails() {
        let mutex = create().unwrap();
        assert_eq!(unlock(mutex), Err(OsError::GeneralFailure));
        delete(mutex).unwrap();
    }

    #[test]
    fn timed_lock_on_deleted_mutex_reports_timeout() {
        let mutex = create().unwrap();
        delete(mutex).unwrap();

        assert_eq!(
            timed_lock(mutex, Duration::from_millis(1)),
            Err(OsError::Timeout)
        );
        assert_eq!(lock(mutex), Err(OsError::GeneralFailure));
    }
}
