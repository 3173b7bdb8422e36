//! Kernel object names.
//!
//! Names only serve diagnostics. Each class of object has its own counter, which wraps
//! back to zero once it passes [`NAME_COUNTER_CEILING`]; names repeat only when more than
//! that many objects of a class are alive at once.

use core::sync::atomic::{AtomicU32, Ordering};

/// Value past which a name counter wraps to zero.
pub(crate) const NAME_COUNTER_CEILING: u32 = 2048;

pub(crate) static THREADS: NameCounter = NameCounter::new(1);
pub(crate) static MUTEXES: NameCounter = NameCounter::new(0);
pub(crate) static SEMAPHORES: NameCounter = NameCounter::new(0);

/// Name of the cancellation semaphore of the ambient thread.
pub(crate) const AMBIENT_CANCEL_SEM_NAME: &str = "pthread_cancelSemGlobal";

pub(crate) struct NameCounter(AtomicU32);

impl NameCounter {
    const fn new(start: u32) -> Self {
        Self(AtomicU32::new(start))
    }

    /// Advances the counter and returns the value to use in the next name.
    pub(crate) fn next(&self) -> u32 {
        let prev = self.0.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
            Some(Self::advance(n))
        });

        match prev {
            Ok(n) | Err(n) => Self::advance(n),
        }
    }

    const fn advance(n: u32) -> u32 {
        if n > NAME_COUNTER_CEILING { 0 } else { n + 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_wraps_past_ceiling() {
        let counter = NameCounter::new(NAME_COUNTER_CEILING - 1);

        assert_eq!(counter.next(), NAME_COUNTER_CEILING);
        assert_eq!(counter.next(), NAME_COUNTER_CEILING + 1);
        assert_eq!(counter.next(), 0);
        assert_eq!(counter.next(), 1);
    }
}
