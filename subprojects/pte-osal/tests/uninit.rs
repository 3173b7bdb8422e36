//! Runs in its own binary: nothing else may initialize the OSAL first.

use std::{ptr, time::Duration};

use pte_osal::{Config, OsError, config, semaphore, thread, tls};

unsafe extern "C-unwind" fn never_runs(_argv: *mut std::ffi::c_void) -> i32 {
    0
}

#[test]
fn primitives_need_init_and_first_config_wins() {
    assert_eq!(
        thread::create(never_runs, 0, thread::default_priority(), ptr::null_mut()),
        Err(OsError::GeneralFailure)
    );
    assert_eq!(tls::alloc(), Err(OsError::GeneralFailure));

    // Plain semaphores need no init, cancellable waits do
    let sem = semaphore::create(1).unwrap();
    assert_eq!(
        semaphore::cancellable_pend(sem, Some(Duration::ZERO)),
        Err(OsError::GeneralFailure)
    );
    semaphore::pend(sem, None).unwrap();
    semaphore::delete(sem).unwrap();

    assert_eq!(config::polling_delay(), config::DEFAULT_POLLING_DELAY);
    assert_eq!(config::min_stack_size(), config::DEFAULT_MIN_STACK_SIZE);

    let custom = Config {
        max_tls_slots: 8,
        polling_delay: Duration::from_millis(1),
        min_stack_size: 0x8000,
    };
    pte_osal::init_with_config(custom).unwrap();
    pte_osal::init().unwrap();

    assert_eq!(config::polling_delay(), Duration::from_millis(1));
    assert_eq!(config::min_stack_size(), 0x8000);
    assert!(tls::alloc().is_ok());
}
