//! Thread lifecycle
//!
//! A thread goes through *created* ([`create`]), *running* ([`start`]), *stopped* (its
//! entry returned, or it called [`exit`]) and is finally *deleted* ([`delete`], or
//! [`exit_and_delete`] from the thread itself). Deletion releases the thread's control
//! block, its cancellation semaphore and its TLS table.
//!
//! Cancellation is cooperative: [`cancel`] raises a request that the target observes the
//! next time it calls [`check_cancel`] or sits in a cancellable wait
//! ([`wait_for_end`], [`crate::semaphore::cancellable_pend`]). A request stays raised until
//! [`clear_cancel`] consumes it, so every later cancellable wait of that thread reports
//! [`OsError::Interrupted`](crate::OsError::Interrupted) as well.

use core::ffi::c_void;

use pte_svc::{Uid, thread as svc};

mod cancel;
pub(crate) mod control;
mod create;
mod info;
mod lifecycle;

pub use cancel::*;
pub(crate) use control::ControlBlock;
pub use control::live_control_blocks;
pub use create::*;
pub use info::*;
pub use lifecycle::*;

/// Entry point of an OSAL thread. Its return value becomes the thread's exit status.
///
/// The ABI allows unwinding so that [`exit`] and [`exit_and_delete`] can be called from
/// inside the entry point.
pub type ThreadEntryPoint = unsafe extern "C-unwind" fn(argv: *mut c_void) -> i32;

/// Maximum count of a cancellation semaphore.
pub(crate) const CANCEL_SEM_MAX: i32 = 255;

/// Handle of a kernel thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ThreadHandle(svc::Handle);

impl ThreadHandle {
    /// Converts a raw kernel UID to a [`ThreadHandle`].
    pub const fn from_raw(raw: Uid) -> Self {
        Self(svc::Handle::from_raw(raw))
    }

    /// Converts the [`ThreadHandle`] to a raw kernel UID.
    pub const fn to_raw(self) -> Uid {
        self.0.to_raw()
    }
}

static_assertions::assert_eq_size!(ThreadHandle, Uid);
