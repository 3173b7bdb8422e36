//! Cancellable waits
//!
//! The kernel can neither wait on two objects at once nor interrupt a blocked call, so a
//! cancellable wait polls: it probes the target without blocking, then the timeout, then
//! the calling thread's cancellation semaphore, and sleeps for the polling delay before
//! trying again. A cancellation or an expired timeout is noticed at most one polling delay
//! late.

use core::time::Duration;

use pte_svc::{clock, thread as svc};

use crate::{OsError, Result, config, thread};

/// Polls `probe` until it reports `true`.
///
/// * `timeout == None` waits forever.
/// * A probe error aborts the wait with that error.
///
/// Fails with [`OsError::Timeout`] once more than `timeout` has elapsed, and with
/// [`OsError::Interrupted`] when the calling thread has a pending cancellation request.
/// A calling thread without a control block (OSAL not initialized) fails with
/// [`OsError::GeneralFailure`] before probing.
pub(crate) fn cancellable<F>(timeout: Option<Duration>, mut probe: F) -> Result<()>
where
    F: FnMut() -> Result<bool>,
{
    let cancel_sem = thread::control::current()?.cancel_sem;
    let start = timeout.map(|_| clock::system_time());

    loop {
        if probe()? {
            return Ok(());
        }

        if let (Some(timeout), Some(start)) = (timeout, start) {
            if clock::system_time().saturating_sub(start) > timeout {
                return Err(OsError::Timeout);
            }
        }

        if thread::is_pending(cancel_sem)? {
            return Err(OsError::Interrupted);
        }

        svc::delay(config::polling_delay_us());
    }
}
