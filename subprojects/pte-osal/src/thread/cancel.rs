//! Cooperative cancellation
//!
//! Each thread owns a counting semaphore (max 255) used as its cancellation flag. A
//! positive count means a request is pending.

use core::time::Duration;

use pte_svc::sema;

use super::{ThreadHandle, control};
use crate::{OsError, Result};

/// Raises a cancellation request on `handle`.
///
/// Fails with [`OsError::GeneralFailure`] when the thread has no control block or when
/// 255 requests are already pending.
pub fn cancel(handle: ThreadHandle) -> Result<()> {
    let block = control::require(handle.to_raw())?;

    sema::signal(block.cancel_sem, 1).map_err(|err| {
        log::warn!("osal: cannot cancel thread {}: {err}", handle.0);
        OsError::GeneralFailure
    })
}

/// Returns [`OsError::Interrupted`] if `handle` has a pending cancellation request.
///
/// The request is not consumed.
pub fn check_cancel(handle: ThreadHandle) -> Result<()> {
    let block = control::require(handle.to_raw())?;

    if is_pending(block.cancel_sem)? {
        Err(OsError::Interrupted)
    } else {
        Ok(())
    }
}

/// Consumes every pending cancellation request of `handle`.
pub fn clear_cancel(handle: ThreadHandle) -> Result<()> {
    let block = control::require(handle.to_raw())?;

    let pending = sema::refer_status(block.cancel_sem)?.current_count;
    if pending > 0 {
        // A concurrent cancel may land after the snapshot; it stays pending
        match sema::wait(block.cancel_sem, pending, Some(Duration::ZERO)) {
            Ok(()) | Err(sema::WaitSemaError::TimedOut) => {}
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

/// Returns `true` if the cancellation semaphore `sem` holds a request.
pub(crate) fn is_pending(sem: sema::Handle) -> Result<bool> {
    Ok(sema::refer_status(sem)?.current_count > 0)
}
