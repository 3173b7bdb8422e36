//! Status codes
//!
//! Kernel and TLS failures are folded into five outcomes: allocation failure is
//! [`OsError::NoResources`], a kernel timeout is [`OsError::Timeout`], an observed
//! cancellation request is [`OsError::Interrupted`], a rejected caller argument is
//! [`OsError::InvalidParam`] and anything else is [`OsError::GeneralFailure`].

use pte_svc::{sema, thread};
use pte_sys_tls::TlsError;

/// Result type of every fallible OSAL primitive.
pub type Result<T, E = OsError> = core::result::Result<T, E>;

/// Failure of an OSAL primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OsError {
    /// A kernel object or memory allocation failed.
    #[error("No resources")]
    NoResources,
    /// An unexpected kernel failure.
    #[error("General failure")]
    GeneralFailure,
    /// The operation timed out.
    #[error("Timed out")]
    Timeout,
    /// The calling thread has a pending cancellation request.
    #[error("Interrupted by cancellation")]
    Interrupted,
    /// The caller passed an argument outside the accepted range.
    #[error("Invalid parameter")]
    InvalidParam,
}

/// C ABI result code.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsStatus {
    Ok = 0,
    NoResources = 1,
    GeneralFailure = 2,
    Timeout = 3,
    Interrupted = 4,
    InvalidParam = 5,
}

static_assertions::assert_eq_size!(OsStatus, core::ffi::c_int);

impl From<OsError> for OsStatus {
    fn from(err: OsError) -> Self {
        match err {
            OsError::NoResources => OsStatus::NoResources,
            OsError::GeneralFailure => OsStatus::GeneralFailure,
            OsError::Timeout => OsStatus::Timeout,
            OsError::Interrupted => OsStatus::Interrupted,
            OsError::InvalidParam => OsStatus::InvalidParam,
        }
    }
}

impl<T> From<Result<T>> for OsStatus {
    fn from(res: Result<T>) -> Self {
        match res {
            Ok(_) => OsStatus::Ok,
            Err(err) => err.into(),
        }
    }
}

impl From<TlsError> for OsError {
    fn from(err: TlsError) -> Self {
        match err {
            TlsError::NoFreeKeys | TlsError::OutOfMemory => OsError::NoResources,
            TlsError::InvalidKey(_) => OsError::InvalidParam,
            TlsError::NotInitialized | TlsError::InvalidTable => OsError::GeneralFailure,
        }
    }
}

impl From<sema::CreateSemaError> for OsError {
    fn from(err: sema::CreateSemaError) -> Self {
        match err {
            sema::CreateSemaError::IllegalCount => OsError::InvalidParam,
            sema::CreateSemaError::OutOfMemory => OsError::NoResources,
        }
    }
}

impl From<sema::DeleteSemaError> for OsError {
    fn from(_: sema::DeleteSemaError) -> Self {
        OsError::GeneralFailure
    }
}

impl From<sema::WaitSemaError> for OsError {
    fn from(err: sema::WaitSemaError) -> Self {
        match err {
            sema::WaitSemaError::TimedOut => OsError::Timeout,
            sema::WaitSemaError::InvalidHandle
            | sema::WaitSemaError::IllegalCount
            | sema::WaitSemaError::Deleted => OsError::GeneralFailure,
        }
    }
}

impl From<sema::SignalSemaError> for OsError {
    fn from(err: sema::SignalSemaError) -> Self {
        match err {
            sema::SignalSemaError::IllegalCount => OsError::InvalidParam,
            sema::SignalSemaError::InvalidHandle | sema::SignalSemaError::Overflow => {
                OsError::GeneralFailure
            }
        }
    }
}

impl From<sema::ReferSemaError> for OsError {
    fn from(_: sema::ReferSemaError) -> Self {
        OsError::GeneralFailure
    }
}

impl From<thread::CreateThreadError> for OsError {
    fn from(err: thread::CreateThreadError) -> Self {
        match err {
            thread::CreateThreadError::OutOfMemory => OsError::NoResources,
            thread::CreateThreadError::InvalidPriority
            | thread::CreateThreadError::InvalidStackSize => OsError::GeneralFailure,
        }
    }
}

impl From<thread::StartThreadError> for OsError {
    fn from(err: thread::StartThreadError) -> Self {
        match err {
            thread::StartThreadError::OutOfMemory => OsError::NoResources,
            thread::StartThreadError::InvalidHandle | thread::StartThreadError::NotDormant => {
                OsError::GeneralFailure
            }
        }
    }
}

impl From<thread::DeleteThreadError> for OsError {
    fn from(_: thread::DeleteThreadError) -> Self {
        OsError::GeneralFailure
    }
}

impl From<thread::ReferThreadError> for OsError {
    fn from(_: thread::ReferThreadError) -> Self {
        OsError::GeneralFailure
    }
}

impl From<thread::ChangePriorityError> for OsError {
    fn from(err: thread::ChangePriorityError) -> Self {
        match err {
            thread::ChangePriorityError::InvalidPriority => OsError::InvalidParam,
            thread::ChangePriorityError::InvalidHandle => OsError::GeneralFailure,
        }
    }
}
