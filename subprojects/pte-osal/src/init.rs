//! Process-wide initialization.

use core::ptr;

use pte_svc::sema;
use pte_sys_tls::SlotKey;
use spin::Once;

use crate::{
    Config, OsError, Result, config, naming,
    thread::{CANCEL_SEM_MAX, ControlBlock, control},
};

/// TLS key of the slot holding each thread's control block.
static CONTROL_KEY: Once<SlotKey> = Once::new();

/// Initializes the OSAL with the default [`Config`].
pub fn init() -> Result<()> {
    init_with_config(Config::default())
}

/// Initializes the OSAL.
///
/// Sets up TLS emulation, reserves the control-block key and gives the ambient thread a
/// control block with its own cancellation semaphore. Only the first successful call has
/// an effect; later calls return `Ok(())` and ignore `config`.
pub fn init_with_config(config: Config) -> Result<()> {
    CONTROL_KEY.try_call_once(|| -> Result<SlotKey> {
        config::apply(&config);

        pte_sys_tls::global_init(config.max_tls_slots)?;
        let key = pte_sys_tls::key_alloc()?;

        if let Err(err) = provision_ambient(key) {
            log::warn!("osal: cannot provision the ambient thread: {err}");
            let _ = pte_sys_tls::key_free(key);
            return Err(err);
        }

        log::debug!(
            "osal: initialized, {} TLS keys, polling delay {:?}",
            pte_sys_tls::key_limit(),
            config.polling_delay
        );
        Ok(key)
    })?;

    Ok(())
}

fn provision_ambient(key: SlotKey) -> Result<()> {
    let table = pte_sys_tls::ambient_table()?;
    let cancel_sem = sema::create(naming::AMBIENT_CANCEL_SEM_NAME, 0, CANCEL_SEM_MAX)?;

    let block = ControlBlock {
        entry: None,
        argv: ptr::null_mut(),
        cancel_sem,
    };
    if let Err(err) = control::install(table, key, block) {
        let _ = sema::delete(cancel_sem);
        return Err(err);
    }

    Ok(())
}

/// Returns the control-block key, failing if [`init`] has not run.
pub(crate) fn control_key() -> Result<SlotKey> {
    CONTROL_KEY.get().copied().ok_or(OsError::GeneralFailure)
}
