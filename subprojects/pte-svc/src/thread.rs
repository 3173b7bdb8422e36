//! Kernel threads
//!
//! A kernel thread is created *dormant* by [`create`] and only begins to run once
//! [`start`]ed. When its entry function returns (or it calls [`exit`]) the thread becomes
//! *stopped* and keeps its kernel object, including the exit status, until [`delete`]d.
//! [`exit_delete`] stops the calling thread and deletes its object in one step.
//!
//! Each kernel thread runs on its own host thread. Host threads that were not created
//! through this module are *adopted* the first time they ask for their own handle via
//! [`current`]: they receive a UID and a kernel-side name, report [`ThreadStatus::Running`]
//! and their object is removed when the host thread ends.
//!
//! Priorities are validated and recorded but scheduling is left to the host.

use std::{
    any::Any,
    cell::RefCell,
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use parking_lot::Mutex;

use crate::object::{self, Object};

define_handle_type! {
    /// A handle to a thread kernel object.
    pub struct Handle
}

/// Kernel thread entry point. Receives the argument given to [`start`]; the return value
/// becomes the thread's exit status.
pub type ThreadEntry = fn(arg: usize) -> i32;

/// Least urgent priority accepted by the kernel. Numerically higher priorities are more
/// urgent.
pub const PRIORITY_LOWEST: i32 = 1;

/// Most urgent priority accepted by the kernel.
pub const PRIORITY_HIGHEST: i32 = 126;

/// Priority reported for adopted host threads.
pub const ADOPTED_THREAD_PRIORITY: i32 = 32;

static_assertions::const_assert!(
    PRIORITY_LOWEST <= ADOPTED_THREAD_PRIORITY && ADOPTED_THREAD_PRIORITY <= PRIORITY_HIGHEST
);

/// Smallest stack the kernel accepts.
pub const MIN_STACK_SIZE: usize = 0x200;

/// Host threads are never given less stack than this, whatever the kernel-side size.
const HOST_STACK_FLOOR: usize = 256 * 1024;

/// Exit status recorded for a thread whose entry function panicked.
pub const PANIC_EXIT_STATUS: i32 = -1;

static ADOPTED_COUNT: AtomicU32 = AtomicU32::new(0);

thread_local! {
    static CURRENT: RefCell<Option<CurrentThread>> = const { RefCell::new(None) };
}

/// Run status of a kernel thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadStatus {
    /// Created but not started.
    Dormant,
    /// Started and not yet returned.
    Running,
    /// Returned from its entry function or exited.
    Stopped,
}

/// Full description of a thread, as reported by [`refer_status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadInfo {
    /// Name given at creation.
    pub name: String,
    /// Current run status.
    pub status: ThreadStatus,
    /// Priority given at creation.
    pub init_priority: i32,
    /// Priority after any [`change_priority`] call.
    pub current_priority: i32,
    /// Kernel-side stack size.
    pub stack_size: usize,
    /// Exit status, once the thread has stopped.
    pub exit_status: Option<i32>,
}

/// Cheap status query result, as reported by [`refer_run_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadRunStatus {
    /// Current run status.
    pub status: ThreadStatus,
    /// Priority after any [`change_priority`] call.
    pub current_priority: i32,
}

pub(crate) struct ThreadObject {
    name: String,
    entry: Option<ThreadEntry>,
    init_priority: i32,
    stack_size: usize,
    state: Mutex<ThreadState>,
}

struct ThreadState {
    status: ThreadStatus,
    current_priority: i32,
    exit_status: Option<i32>,
}

/// Payload used to unwind a kernel thread out of its entry function.
struct ExitRequest {
    status: i32,
    delete: bool,
}

/// The kernel identity of the host thread, set on first use.
struct CurrentThread {
    handle: Handle,
    adopted: bool,
}

impl Drop for CurrentThread {
    fn drop(&mut self) {
        if self.adopted {
            let _ = object::remove_thread(self.handle.0);
        }
    }
}

/// Creates a new thread in the *dormant* state.
///
/// * `name` – kernel-side name, reported back by [`refer_status`].
/// * `entry` – function run once the thread is [`start`]ed.
/// * `priority` – in `PRIORITY_LOWEST..=PRIORITY_HIGHEST`.
/// * `stack_size` – at least [`MIN_STACK_SIZE`] bytes.
pub fn create(
    name: &str,
    entry: ThreadEntry,
    priority: i32,
    stack_size: usize,
) -> Result<Handle, CreateThreadError> {
    if !(PRIORITY_LOWEST..=PRIORITY_HIGHEST).contains(&priority) {
        return Err(CreateThreadError::InvalidPriority);
    }
    if stack_size < MIN_STACK_SIZE {
        return Err(CreateThreadError::InvalidStackSize);
    }

    let thread = ThreadObject {
        name: name.to_owned(),
        entry: Some(entry),
        init_priority: priority,
        stack_size,
        state: Mutex::new(ThreadState {
            status: ThreadStatus::Dormant,
            current_priority: priority,
            exit_status: None,
        }),
    };

    let uid = object::insert(Object::Thread(Arc::new(thread)))
        .map_err(|_| CreateThreadError::OutOfMemory)?;
    Ok(Handle(uid))
}

#[derive(Debug, thiserror::Error)]
pub enum CreateThreadError {
    /// The priority is outside `PRIORITY_LOWEST..=PRIORITY_HIGHEST`.
    #[error("Invalid priority")]
    InvalidPriority,
    /// The stack is smaller than [`MIN_STACK_SIZE`].
    #[error("Invalid stack size")]
    InvalidStackSize,
    /// The kernel object table is exhausted.
    #[error("Out of memory")]
    OutOfMemory,
}

/// Transitions a *dormant* thread to *running*, passing `arg` to its entry function.
pub fn start(handle: Handle, arg: usize) -> Result<(), StartThreadError> {
    let thread = object::get_thread(handle.0).ok_or(StartThreadError::InvalidHandle)?;
    let entry = thread.entry.ok_or(StartThreadError::NotDormant)?;

    {
        let mut state = thread.state.lock();
        if state.status != ThreadStatus::Dormant {
            return Err(StartThreadError::NotDormant);
        }
        state.status = ThreadStatus::Running;
    }

    let spawned = std::thread::Builder::new()
        .name(thread.name.clone())
        .stack_size(thread.stack_size.max(HOST_STACK_FLOOR))
        .spawn({
            let thread = Arc::clone(&thread);
            move || run(handle, thread, entry, arg)
        });

    // The host thread is detached; its kernel object carries the exit status
    match spawned {
        Ok(_) => Ok(()),
        Err(err) => {
            log::warn!("kernel: cannot spawn host thread for '{}': {err}", thread.name);
            thread.state.lock().status = ThreadStatus::Dormant;
            Err(StartThreadError::OutOfMemory)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StartThreadError {
    /// The handle does not name a live thread.
    #[error("Invalid handle")]
    InvalidHandle,
    /// The thread was already started.
    #[error("Thread is not dormant")]
    NotDormant,
    /// The host refused to spawn a thread.
    #[error("Out of memory")]
    OutOfMemory,
}

/// Host-thread body of a kernel thread.
fn run(handle: Handle, thread: Arc<ThreadObject>, entry: ThreadEntry, arg: usize) {
    CURRENT.with(|current| {
        *current.borrow_mut() = Some(CurrentThread {
            handle,
            adopted: false,
        })
    });

    let (exit_status, delete) = match panic::catch_unwind(AssertUnwindSafe(|| entry(arg))) {
        Ok(status) => (status, false),
        Err(payload) => match payload.downcast::<ExitRequest>() {
            Ok(request) => (request.status, request.delete),
            Err(payload) => {
                log::error!(
                    "kernel: thread '{}' panicked: {}",
                    thread.name,
                    panic_message(payload.as_ref())
                );
                (PANIC_EXIT_STATUS, false)
            }
        },
    };

    {
        let mut state = thread.state.lock();
        state.status = ThreadStatus::Stopped;
        state.exit_status = Some(exit_status);
    }

    if delete {
        let _ = object::remove_thread(handle.0);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "<non-string panic payload>"
    }
}

/// Deletes a thread that is *dormant* or *stopped*.
pub fn delete(handle: Handle) -> Result<(), DeleteThreadError> {
    let thread = object::get_thread(handle.0).ok_or(DeleteThreadError::InvalidHandle)?;
    if thread.state.lock().status == ThreadStatus::Running {
        return Err(DeleteThreadError::NotDormant);
    }

    object::remove_thread(handle.0).ok_or(DeleteThreadError::InvalidHandle)?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteThreadError {
    /// The handle does not name a live thread.
    #[error("Invalid handle")]
    InvalidHandle,
    /// The thread is still running.
    #[error("Thread is not dormant")]
    NotDormant,
}

/// Stops the calling thread with `status` as its exit status.
///
/// The thread's object is kept until [`delete`]d. The calling thread unwinds out of its
/// entry function; this must only be called from a thread created with [`create`]. From an
/// adopted host thread the unwind reaches the top of that host thread instead.
pub fn exit(status: i32) -> ! {
    panic::resume_unwind(Box::new(ExitRequest {
        status,
        delete: false,
    }))
}

/// Stops the calling thread and deletes its kernel object.
///
/// Same unwinding rules as [`exit`].
pub fn exit_delete(status: i32) -> ! {
    panic::resume_unwind(Box::new(ExitRequest {
        status,
        delete: true,
    }))
}

/// Returns the handle of the calling thread, adopting the host thread if needed.
pub fn current() -> Handle {
    CURRENT.with(|current| {
        let mut current = current.borrow_mut();
        match current.as_ref() {
            Some(thread) => thread.handle,
            None => {
                let handle = adopt();
                *current = Some(CurrentThread {
                    handle,
                    adopted: true,
                });
                handle
            }
        }
    })
}

/// Registers the calling host thread as a running kernel thread.
fn adopt() -> Handle {
    let seq = ADOPTED_COUNT.fetch_add(1, Ordering::Relaxed);
    let name = if seq == 0 {
        String::from("user_main")
    } else {
        format!("user_thread{seq:04}")
    };

    let thread = ThreadObject {
        name,
        entry: None,
        init_priority: ADOPTED_THREAD_PRIORITY,
        stack_size: 0,
        state: Mutex::new(ThreadState {
            status: ThreadStatus::Running,
            current_priority: ADOPTED_THREAD_PRIORITY,
            exit_status: None,
        }),
    };

    Handle(object::insert_unbounded(Object::Thread(Arc::new(thread))))
}

/// Returns the full description of a thread.
pub fn refer_status(handle: Handle) -> Result<ThreadInfo, ReferThreadError> {
    let thread = object::get_thread(handle.0).ok_or(ReferThreadError::InvalidHandle)?;
    let state = thread.state.lock();

    Ok(ThreadInfo {
        name: thread.name.clone(),
        status: state.status,
        init_priority: thread.init_priority,
        current_priority: state.current_priority,
        stack_size: thread.stack_size,
        exit_status: state.exit_status,
    })
}

/// Returns the run status and current priority of a thread.
pub fn refer_run_status(handle: Handle) -> Result<ThreadRunStatus, ReferThreadError> {
    let thread = object::get_thread(handle.0).ok_or(ReferThreadError::InvalidHandle)?;
    let state = thread.state.lock();

    Ok(ThreadRunStatus {
        status: state.status,
        current_priority: state.current_priority,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ReferThreadError {
    /// The handle does not name a live thread.
    #[error("Invalid handle")]
    InvalidHandle,
}

/// Changes the current priority of a thread.
pub fn change_priority(handle: Handle, priority: i32) -> Result<(), ChangePriorityError> {
    if !(PRIORITY_LOWEST..=PRIORITY_HIGHEST).contains(&priority) {
        return Err(ChangePriorityError::InvalidPriority);
    }

    let thread = object::get_thread(handle.0).ok_or(ChangePriorityError::InvalidHandle)?;
    thread.state.lock().current_priority = priority;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ChangePriorityError {
    /// The handle does not name a live thread.
    #[error("Invalid handle")]
    InvalidHandle,
    /// The priority is outside `PRIORITY_LOWEST..=PRIORITY_HIGHEST`.
    #[error("Invalid priority")]
    InvalidPriority,
}

/// Suspends the calling thread for `micros` microseconds.
pub fn delay(micros: u32) {
    std::thread::sleep(Duration::from_micros(u64::from(micros)));
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    fn wait_stopped(handle: Handle) -> ThreadInfo {
        let start = Instant::now();
        loop {
            let info = refer_status(handle).unwrap();
            if info.status == ThreadStatus::Stopped {
                return info;
            }
            assert!(start.elapsed() < Duration::from_secs(5), "thread never stopped");
            delay(100);
        }
    }

    fn returns_arg(arg: usize) -> i32 {
        arg as i32
    }

    fn exits_early(_arg: usize) -> i32 {
        exit(7);
    }

    fn exits_and_deletes(_arg: usize) -> i32 {
        exit_delete(0);
    }

    #[test]
    fn created_thread_is_dormant_until_started() {
        let th = create("dormant", returns_arg, 20, 0x1000).unwrap();
        assert_eq!(refer_status(th).unwrap().status, ThreadStatus::Dormant);

        start(th, 42).unwrap();
        let info = wait_stopped(th);

        assert_eq!(info.name, "dormant");
        assert_eq!(info.exit_status, Some(42));
        assert!(matches!(start(th, 0), Err(StartThreadError::NotDormant)));

        delete(th).unwrap();
        assert!(matches!(refer_status(th), Err(ReferThreadError::InvalidHandle)));
    }

    #[test]
    fn exit_records_status() {
        let th = create("exit", exits_early, 20, 0x1000).unwrap();
        start(th, 0).unwrap();

        assert_eq!(wait_stopped(th).exit_status, Some(7));
        delete(th).unwrap();
    }

    #[test]
    fn exit_delete_removes_object() {
        let th = create("exit_delete", exits_and_deletes, 20, 0x1000).unwrap();
        start(th, 0).unwrap();

        let start = Instant::now();
        while refer_status(th).is_ok() {
            assert!(start.elapsed() < Duration::from_secs(5));
            delay(100);
        }
    }

    #[test]
    fn create_validates_priority() {
        assert!(matches!(
            create("prio", returns_arg, 0, 0x1000),
            Err(CreateThreadError::InvalidPriority)
        ));
        assert!(matches!(
            create("prio", returns_arg, PRIORITY_HIGHEST + 1, 0x1000),
            Err(CreateThreadError::InvalidPriority)
        ));
    }

    #[test]
    fn higher_priority_is_more_urgent() {
        assert!(PRIORITY_LOWEST < PRIORITY_HIGHEST);

        let th = create("urgent", returns_arg, PRIORITY_HIGHEST, 0x1000).unwrap();
        assert_eq!(refer_status(th).unwrap().init_priority, PRIORITY_HIGHEST);
        change_priority(th, PRIORITY_LOWEST).unwrap();
        assert_eq!(refer_run_status(th).unwrap().current_priority, PRIORITY_LOWEST);
        delete(th).unwrap();
    }

    #[test]
    fn adopted_thread_is_stable_and_running() {
        let me = current();
        assert_eq!(me, current());

        let status = refer_run_status(me).unwrap();
        assert_eq!(status.status, ThreadStatus::Running);
        assert!(matches!(delete(me), Err(DeleteThreadError::NotDormant)));
    }

    #[test]
    fn change_priority_is_reported() {
        let th = create("chprio", returns_arg, 20, 0x1000).unwrap();

        change_priority(th, 25).unwrap();
        assert_eq!(refer_run_status(th).unwrap().current_priority, 25);
        assert_eq!(refer_status(th).unwrap().init_priority, 20);

        delete(th).unwrap();
    }
}
