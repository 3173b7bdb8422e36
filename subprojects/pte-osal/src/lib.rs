//! # pte-osal
//!
//! OS abstraction layer for the PTE threading library on a single-core kernel without
//! thread-local storage and without a way to interrupt a blocked call.
//!
//! The layer exposes the primitives the threading library is built on:
//!
//! * [`thread`]: lifecycle of kernel threads, cooperative cancellation and a cancellable
//!   join;
//! * [`mutex`] and [`semaphore`]: thin projections onto the kernel counting semaphore,
//!   including a cancellable pend;
//! * [`tls`]: thread-local slots for the calling thread, emulated on top of
//!   [`pte_sys_tls`];
//! * [`atomic`]: integer read-modify-write operations made atomic by masking interrupts.
//!
//! [`init`] must run once before anything else. It sets up TLS emulation, reserves the
//! slot holding each thread's control block and provisions the control block of the
//! *ambient* thread: the one unmanaged thread (usually `main`) allowed to call into the
//! layer without having been created by [`thread::create`].
//!
//! Every fallible primitive returns [`Result`] with an [`OsError`]; with the `ffi`
//! feature the `pte_os*` C functions flatten it to an [`OsStatus`].
//!
//! The crate itself only needs `core` and `alloc`. It still links `std` through
//! [`pte_svc`], the host emulation of the kernel.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod atomic;
pub mod config;
mod init;
pub mod mutex;
mod naming;
pub mod semaphore;
mod status;
pub mod thread;
pub mod tls;
mod wait;

pub use config::Config;
pub use init::{init, init_with_config};
pub use status::{OsError, OsStatus, Result};

#[cfg(feature = "ffi")]
mod ffi;
