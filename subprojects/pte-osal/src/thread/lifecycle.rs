use pte_svc::thread as svc;

use super::{ThreadHandle, create::release};
use crate::{OsError, Result, wait};

/// Deletes a stopped (or never started) thread and releases its OSAL resources.
///
/// Fails with [`OsError::GeneralFailure`] for a thread not created by
/// [`create`](super::create) or one that is still running; its resources are then left
/// untouched.
pub fn delete(handle: ThreadHandle) -> Result<()> {
    let uid = handle.to_raw();
    let Some(table) = pte_sys_tls::binding(uid) else {
        log::warn!("osal: thread {} is not managed, refusing to delete it", handle.0);
        return Err(OsError::GeneralFailure);
    };

    svc::delete(handle.0).map_err(|err| {
        log::warn!("osal: cannot delete thread {}: {err}", handle.0);
        OsError::from(err)
    })?;

    pte_sys_tls::unbind(uid);
    release(table);

    log::debug!("osal: deleted thread {}", handle.0);
    Ok(())
}

/// Releases the OSAL resources of `handle`, then terminates and deletes the calling
/// thread.
///
/// `handle` is normally the caller's own handle. When it names another thread, that thread
/// is deleted as by [`delete`] first.
pub fn exit_and_delete(handle: ThreadHandle) -> ! {
    if handle.0 == svc::current() {
        if let Some(table) = pte_sys_tls::unbind(handle.to_raw()) {
            release(table);
        }
    } else if let Err(err) = delete(handle) {
        log::warn!("osal: exit_and_delete could not delete thread {}: {err}", handle.0);
    }

    svc::exit_delete(0)
}

/// Terminates the calling thread. Its OSAL resources are kept until it is deleted.
pub fn exit() -> ! {
    svc::exit(0)
}

/// Waits until the thread `handle` stops.
///
/// The wait is cancellable: it fails with [`OsError::Interrupted`] as soon as the calling
/// thread has a pending cancellation request.
pub fn wait_for_end(handle: ThreadHandle) -> Result<()> {
    wait::cancellable(None, || {
        let status = svc::refer_run_status(handle.0)?;
        Ok(status.status == svc::ThreadStatus::Stopped)
    })
}

/// Suspends the calling thread for `msecs` milliseconds.
pub fn sleep(msecs: u32) {
    for micros in delay_chunks(msecs) {
        svc::delay(micros);
    }
}

/// Longest kernel delay, in whole milliseconds.
const MAX_DELAY_MS: u32 = u32::MAX / 1000;

/// Splits `msecs` into kernel delays in µs. Yields a single zero delay for zero.
fn delay_chunks(msecs: u32) -> impl Iterator<Item = u32> {
    let full = msecs / MAX_DELAY_MS;
    let rest = msecs % MAX_DELAY_MS;
    let tail = (rest > 0 || full == 0).then_some(rest * 1000);

    core::iter::repeat_n(MAX_DELAY_MS * 1000, full as usize).chain(tail)
}
