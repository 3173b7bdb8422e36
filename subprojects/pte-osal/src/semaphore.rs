//! Counting semaphores

use alloc::format;
use core::time::Duration;

use pte_svc::{Uid, sema};

use crate::{OsError, Result, naming, wait};

/// Largest count a semaphore can hold.
pub const SEM_VALUE_MAX: i32 = i32::MAX;

/// Handle of a counting semaphore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct SemaphoreHandle(sema::Handle);

impl SemaphoreHandle {
    /// Converts a raw kernel UID to a [`SemaphoreHandle`].
    pub const fn from_raw(raw: Uid) -> Self {
        Self(sema::Handle::from_raw(raw))
    }

    /// Converts the [`SemaphoreHandle`] to a raw kernel UID.
    pub const fn to_raw(self) -> Uid {
        self.0.to_raw()
    }
}

/// Creates a semaphore holding `initial` units.
///
/// A negative `initial` fails with [`OsError::InvalidParam`].
pub fn create(initial: i32) -> Result<SemaphoreHandle> {
    if initial < 0 {
        return Err(OsError::InvalidParam);
    }

    let name = format!("pthread_sem{}", naming::SEMAPHORES.next());
    let handle = sema::create(&name, initial, SEM_VALUE_MAX)?;
    Ok(SemaphoreHandle(handle))
}

/// Deletes a semaphore. No thread may be waiting on it.
pub fn delete(handle: SemaphoreHandle) -> Result<()> {
    sema::delete(handle.0)?;
    Ok(())
}

/// Adds `count` units. A `count` below one fails with [`OsError::InvalidParam`].
pub fn post(handle: SemaphoreHandle, count: i32) -> Result<()> {
    if count < 1 {
        return Err(OsError::InvalidParam);
    }

    sema::signal(handle.0, count)?;
    Ok(())
}

/// Takes one unit, waiting at most `timeout` (forever when `None`).
pub fn pend(handle: SemaphoreHandle, timeout: Option<Duration>) -> Result<()> {
    sema::wait(handle.0, 1, timeout)?;
    Ok(())
}

/// Takes one unit like [`pend`], but gives up with [`OsError::Interrupted`] as soon as the
/// calling thread has a pending cancellation request.
pub fn cancellable_pend(handle: SemaphoreHandle, timeout: Option<Duration>) -> Result<()> {
    wait::cancellable(timeout, || {
        match sema::wait(handle.0, 1, Some(Duration::ZERO)) {
            Ok(()) => Ok(true),
            Err(sema::WaitSemaError::TimedOut) => Ok(false),
            Err(err) => {
                log::warn!("osal: cancellable pend on {} failed: {err}", handle.0);
                Err(OsError::GeneralFailure)
            }
        }
    })
}
