//! Interrupt masking
//!
//! On a single core, disabling interrupts guarantees that nothing else runs until they
//! are re-enabled. On the host this is modelled as a process-wide critical section: the
//! thread that disables interrupts owns the mask, and every other thread trying to
//! disable them waits until the owner restores it.
//!
//! Masking nests: disabling interrupts while they are already disabled by the calling
//! thread succeeds immediately and returns a state that leaves them disabled on restore.

use std::{
    cell::Cell,
    sync::atomic::{AtomicU64, Ordering},
};

/// Token of the thread that currently owns the mask; `0` when interrupts are enabled.
static MASK_OWNER: AtomicU64 = AtomicU64::new(0);
static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static TOKEN: Cell<u64> = const { Cell::new(0) };
}

/// Interrupt state saved by [`disable`], to be passed back to [`restore`].
#[must_use = "interrupts stay disabled until the state is restored"]
#[derive(Debug)]
pub struct InterruptState(bool);

impl InterruptState {
    /// Returns `true` if interrupts were enabled when the state was saved.
    pub fn were_enabled(&self) -> bool {
        self.0
    }
}

/// Disables interrupts and returns the previous state.
pub fn disable() -> InterruptState {
    let token = token();
    if MASK_OWNER.load(Ordering::Acquire) == token {
        return InterruptState(false);
    }

    while MASK_OWNER
        .compare_exchange_weak(0, token, Ordering::Acquire, Ordering::Relaxed)
        .is_err()
    {
        std::thread::yield_now();
    }

    InterruptState(true)
}

/// Restores the interrupt state saved by [`disable`].
pub fn restore(state: InterruptState) {
    if state.0 {
        MASK_OWNER.store(0, Ordering::Release);
    }
}

/// Returns `true` unless the calling thread has interrupts disabled.
pub fn are_enabled() -> bool {
    MASK_OWNER.load(Ordering::Acquire) != token()
}

fn token() -> u64 {
    TOKEN.with(|token| {
        if token.get() == 0 {
            token.set(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed));
        }
        token.get()
    })
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, atomic::AtomicU32},
        thread,
    };

    use super::*;

    #[test]
    fn masking_nests() {
        let outer = disable();
        assert!(!are_enabled());

        let inner = disable();
        assert!(!inner.were_enabled());
        restore(inner);
        assert!(!are_enabled());

        restore(outer);
        assert!(are_enabled());
    }

    #[test]
    fn masked_sections_exclude_each_other() {
        let counter = Arc::new(AtomicU32::new(0));

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        let state = disable();
                        // Non-atomic read-modify-write, only correct under the mask
                        let value = counter.load(Ordering::Relaxed);
                        counter.store(value + 1, Ordering::Relaxed);
                        restore(state);
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(counter.load(Ordering::Relaxed), 4000);
    }
}
