//! Thread creation
//!
//! The kernel thread always runs [`stub_entry`]. The real entry point and its argument
//! are kept in the control block, which the stub finds through the TLS table bound to its
//! own kernel UID.

use alloc::format;
use core::ffi::c_void;

use pte_svc::{sema, thread as svc};
use pte_sys_tls::TableId;

use super::{CANCEL_SEM_MAX, ControlBlock, ThreadEntryPoint, ThreadHandle, control};
use crate::{OsError, Result, config, init, naming};

/// Exit status of a kernel thread that could not find its control block.
const NO_CONTROL_BLOCK_STATUS: i32 = -1;

/// Creates a thread in the *created* state.
///
/// `stack_size` is raised to [`config::min_stack_size`] if smaller. The thread runs
/// `entry(argv)` once [`start`]ed.
///
/// Fails with [`OsError::NoResources`] when the kernel or the TLS emulation runs out of
/// objects, and with [`OsError::GeneralFailure`] on any other kernel failure. Nothing is
/// leaked on failure.
pub fn create(
    entry: ThreadEntryPoint,
    stack_size: usize,
    priority: i32,
    argv: *mut c_void,
) -> Result<ThreadHandle> {
    let key = init::control_key()?;
    let stack_size = stack_size.max(config::min_stack_size());
    let seq = naming::THREADS.next();

    let table = pte_sys_tls::thread_init().map_err(|err| {
        log::warn!("osal: cannot allocate a TLS table: {err}");
        OsError::NoResources
    })?;

    let cancel_sem = match sema::create(&format!("pthread_cancelSem{seq:04}"), 0, CANCEL_SEM_MAX)
    {
        Ok(sem) => sem,
        Err(err) => {
            log::warn!("osal: cannot create cancellation semaphore: {err}");
            let _ = pte_sys_tls::thread_destroy(table);
            return Err(err.into());
        }
    };

    let block = ControlBlock {
        entry: Some(entry),
        argv,
        cancel_sem,
    };
    if let Err(err) = control::install(table, key, block) {
        let _ = sema::delete(cancel_sem);
        let _ = pte_sys_tls::thread_destroy(table);
        return Err(err);
    }

    let name = format!("pthread{seq:04}__{table:x}");
    let handle = match svc::create(&name, stub_entry, priority, stack_size) {
        Ok(handle) => handle,
        Err(err) => {
            log::warn!("osal: cannot create thread '{name}': {err}");
            release(table);
            return Err(err.into());
        }
    };

    if let Err(err) = pte_sys_tls::bind(handle.to_raw(), table) {
        log::warn!("osal: cannot bind thread '{name}' to its TLS table: {err}");
        let _ = svc::delete(handle);
        release(table);
        return Err(err.into());
    }

    log::debug!("osal: created thread '{name}' ({handle})");
    Ok(ThreadHandle(handle))
}

/// Moves a *created* thread to *running*.
///
/// Always succeeds; a kernel failure is only logged.
pub fn start(handle: ThreadHandle) -> Result<()> {
    match svc::start(handle.0, 0) {
        Ok(()) => log::debug!("osal: started thread {}", handle.0),
        Err(err) => log::warn!("osal: cannot start thread {}: {err}", handle.0),
    }
    Ok(())
}

/// Releases the control block, the cancellation semaphore and the TLS table of a thread.
pub(crate) fn release(table: TableId) {
    match control::take(table) {
        Ok(Some(block)) => {
            if let Err(err) = sema::delete(block.cancel_sem) {
                log::warn!("osal: cannot delete cancellation semaphore: {err}");
            }
        }
        Ok(None) => {}
        Err(err) => log::warn!("osal: cannot release control block: {err}"),
    }

    if let Err(err) = pte_sys_tls::thread_destroy(table) {
        log::warn!("osal: cannot destroy TLS table {table:x}: {err}");
    }
}

/// Kernel entry of every OSAL thread.
fn stub_entry(_arg: usize) -> i32 {
    let me = svc::current();

    match control::of(me.to_raw()) {
        Ok(Some(ControlBlock {
            entry: Some(entry),
            argv,
            ..
        })) => {
            // SAFETY: the entry point and its argument were supplied together to `create`
            unsafe { entry(argv) }
        }
        _ => {
            log::error!("osal: thread {me} started without a control block");
            NO_CONTROL_BLOCK_STATUS
        }
    }
}
