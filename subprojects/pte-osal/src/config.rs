//! Runtime configuration
//!
//! [`Config`] is applied by [`crate::init_with_config`]. The polling delay of cancellable
//! waits can also be changed at any time with [`set_polling_delay`].

use core::{
    sync::atomic::{AtomicU32, AtomicUsize, Ordering},
    time::Duration,
};

/// Default number of TLS keys.
pub const DEFAULT_MAX_TLS_SLOTS: u32 = 32;

/// Default sleep between two probes of a cancellable wait.
pub const DEFAULT_POLLING_DELAY: Duration = Duration::from_micros(100);

/// Default lower bound applied to thread stack sizes.
pub const DEFAULT_MIN_STACK_SIZE: usize = 4096;

static POLLING_DELAY_US: AtomicU32 = AtomicU32::new(DEFAULT_POLLING_DELAY.as_micros() as u32);
static MIN_STACK_SIZE: AtomicUsize = AtomicUsize::new(DEFAULT_MIN_STACK_SIZE);

static_assertions::const_assert!(DEFAULT_POLLING_DELAY.as_micros() <= u32::MAX as u128);
static_assertions::const_assert!(DEFAULT_MAX_TLS_SLOTS as usize <= pte_sys_tls::MAX_SLOTS);

/// OSAL configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Number of TLS keys handed out, clamped to [`pte_sys_tls::MAX_SLOTS`]. One key is
    /// reserved for the thread control blocks.
    pub max_tls_slots: u32,
    /// Sleep between two probes of a cancellable wait. Bounds how late a cancellation or a
    /// timeout is noticed.
    pub polling_delay: Duration,
    /// Stack sizes passed to [`crate::thread::create`] are raised to at least this value.
    pub min_stack_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_tls_slots: DEFAULT_MAX_TLS_SLOTS,
            polling_delay: DEFAULT_POLLING_DELAY,
            min_stack_size: DEFAULT_MIN_STACK_SIZE,
        }
    }
}

pub(crate) fn apply(config: &Config) {
    set_polling_delay(config.polling_delay);
    MIN_STACK_SIZE.store(config.min_stack_size, Ordering::Relaxed);
}

/// Sets the sleep between two probes of a cancellable wait.
///
/// The delay is kept with microsecond precision and saturates at `u32::MAX` µs.
pub fn set_polling_delay(delay: Duration) {
    let micros = u32::try_from(delay.as_micros()).unwrap_or(u32::MAX);
    POLLING_DELAY_US.store(micros, Ordering::Relaxed);
}

/// Returns the sleep between two probes of a cancellable wait.
pub fn polling_delay() -> Duration {
    Duration::from_micros(u64::from(polling_delay_us()))
}

pub(crate) fn polling_delay_us() -> u32 {
    POLLING_DELAY_US.load(Ordering::Relaxed)
}

/// Returns the lower bound applied to thread stack sizes.
pub fn min_stack_size() -> usize {
    MIN_STACK_SIZE.load(Ordering::Relaxed)
}
