//! System clock
//!
//! Monotonic time elapsed since the kernel clock was first read.

use std::{sync::OnceLock, time::Duration, time::Instant};

static BOOT: OnceLock<Instant> = OnceLock::new();

/// Returns the time elapsed since boot.
pub fn system_time() -> Duration {
    BOOT.get_or_init(Instant::now).elapsed()
}

/// Returns the time elapsed since boot, in microseconds.
pub fn system_time_wide() -> u64 {
    u64::try_from(system_time().as_micros()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_time_is_monotonic() {
        let a = system_time_wide();
        std::thread::sleep(Duration::from_millis(2));
        let b = system_time_wide();
        assert!(b >= a + 2000);
    }
}
