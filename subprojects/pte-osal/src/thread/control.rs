//! Thread control blocks
//!
//! A control block is boxed and its pointer stored in the reserved control-block slot of
//! the thread's TLS table. The ambient table gets one at init time; every table created by
//! [`create`](super::create) gets one until the thread is deleted.

use alloc::boxed::Box;
use core::{
    ffi::c_void,
    ptr,
    sync::atomic::{AtomicUsize, Ordering},
};

use pte_svc::{Uid, sema, thread as svc};
use pte_sys_tls::{SlotKey, TableId};

use super::ThreadEntryPoint;
use crate::{OsError, Result, init};

static LIVE_CONTROL_BLOCKS: AtomicUsize = AtomicUsize::new(0);

/// Per-thread data the kernel has no room for.
#[derive(Clone, Copy)]
pub(crate) struct ControlBlock {
    /// `None` for the ambient thread.
    pub(crate) entry: Option<ThreadEntryPoint>,
    pub(crate) argv: *mut c_void,
    pub(crate) cancel_sem: sema::Handle,
}

/// Returns the number of live control blocks, the ambient thread's included.
pub fn live_control_blocks() -> usize {
    LIVE_CONTROL_BLOCKS.load(Ordering::Acquire)
}

/// Stores `block` in the control-block slot of `table`.
pub(crate) fn install(table: TableId, key: SlotKey, block: ControlBlock) -> Result<()> {
    let raw = Box::into_raw(Box::new(block));

    if let Err(err) = pte_sys_tls::set_value(table, key, raw.cast()) {
        // SAFETY: `raw` was never published
        drop(unsafe { Box::from_raw(raw) });
        return Err(err.into());
    }

    LIVE_CONTROL_BLOCKS.fetch_add(1, Ordering::AcqRel);
    Ok(())
}

/// Removes the control block of `table` and returns it.
pub(crate) fn take(table: TableId) -> Result<Option<ControlBlock>> {
    let key = init::control_key()?;

    let raw = pte_sys_tls::get_value(table, key)?.cast::<ControlBlock>();
    if raw.is_null() {
        return Ok(None);
    }
    pte_sys_tls::set_value(table, key, ptr::null_mut())?;

    LIVE_CONTROL_BLOCKS.fetch_sub(1, Ordering::AcqRel);

    // SAFETY: the slot only ever holds pointers created by `install`, and the slot was
    // cleared above so the box is reclaimed once
    let block = unsafe { Box::from_raw(raw) };
    Ok(Some(*block))
}

/// Returns the control block of the thread `thread`, resolved through its TLS table.
pub(crate) fn of(thread: Uid) -> Result<Option<ControlBlock>> {
    let key = init::control_key()?;
    let table = table_of(thread)?;

    let raw = pte_sys_tls::get_value(table, key)?.cast::<ControlBlock>();
    if raw.is_null() {
        return Ok(None);
    }

    // SAFETY: the block stays allocated until the thread is deleted, which callers must
    // not race with
    Ok(Some(unsafe { *raw }))
}

/// Returns the control block of `thread`, failing if it has none.
pub(crate) fn require(thread: Uid) -> Result<ControlBlock> {
    of(thread)?.ok_or_else(|| {
        log::warn!("osal: thread {thread:#x} has no control block");
        OsError::GeneralFailure
    })
}

/// Returns the TLS table of `thread`.
///
/// An unbound thread falls back to the ambient table only if it is the caller or a thread
/// the kernel still knows; a deleted or unknown UID fails with [`OsError::GeneralFailure`].
fn table_of(thread: Uid) -> Result<TableId> {
    if let Some(table) = pte_sys_tls::binding(thread) {
        return Ok(table);
    }

    if thread != svc::current().to_raw()
        && svc::refer_run_status(svc::Handle::from_raw(thread)).is_err()
    {
        log::warn!("osal: thread {thread:#x} does not exist");
        return Err(OsError::GeneralFailure);
    }

    Ok(pte_sys_tls::ambient_table()?)
}

/// Returns the control block of the calling thread.
pub(crate) fn current() -> Result<ControlBlock> {
    require(svc::current().to_raw())
}
