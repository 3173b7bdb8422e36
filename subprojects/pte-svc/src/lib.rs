//! # pte-svc
//!
//! Kernel services for the PTE OS abstraction layer.
//!
//! The target kernel is a single-core, UID-addressed kernel in the style of the PSP
//! `sceKernel*` API: it offers counting semaphores, threads created in a suspended
//! (*dormant*) state, thread status queries, interrupt masking and microsecond delays.
//! It does **not** offer thread-local storage, nor a way to interrupt a blocked call
//! from another thread. Those two gaps are what the upper layers emulate.
//!
//! This crate reproduces the kernel semantics on a development host:
//!
//! * every kernel object lives in a process-wide [object table](object), addressed by a
//!   positive UID and bounded by a configurable capacity (exhaustion reports
//!   *out of memory*, like the real kernel does);
//! * [`sema`] implements counting semaphores with bounded counts, timed waits and
//!   zero-timeout polls;
//! * [`thread`] runs each kernel thread on a host thread, keeps the kernel-side name,
//!   priority and run status, and lets the host threads that were never created through
//!   the kernel (the process' main thread, test harness threads) be *adopted* so that they
//!   get a UID of their own;
//! * [`interrupts`] models "interrupts disabled" as a process-wide critical section owned
//!   by one thread at a time, which is what masking interrupts means on a single core;
//! * [`clock`] exposes the monotonic system time.
//!
//! Every fallible call returns a dedicated error enum so that callers can map kernel
//! failures precisely.

#[macro_use]
mod handle;

pub mod clock;
pub mod interrupts;
pub mod object;
pub mod sema;
pub mod thread;

pub use handle::{INVALID_UID, Uid};
