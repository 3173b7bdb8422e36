//! Kernel object table
//!
//! All kernel objects (semaphores and threads) share one UID space. The table is bounded:
//! once [`object_limit`] objects are alive, creating another one fails the same way the
//! target kernel fails when its object heap is exhausted.
//!
//! Threads adopted from the host (see [`crate::thread::current`]) are inserted without
//! checking the limit, as the kernel's own main thread always has an object.

use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicI32, AtomicUsize, Ordering},
    },
};

use parking_lot::Mutex;

use crate::{Uid, sema::SemaObject, thread::ThreadObject};

/// Default capacity of the object table.
pub const DEFAULT_OBJECT_LIMIT: usize = 4096;

/// First UID handed out. Real kernels use large, sparse identifiers; keeping them away
/// from small integers makes accidental use of a counter or an index as a UID fail fast.
const FIRST_UID: Uid = 0x0400_0001;

static_assertions::const_assert!(FIRST_UID > crate::INVALID_UID);

static OBJECTS: Mutex<BTreeMap<Uid, Object>> = Mutex::new(BTreeMap::new());
static NEXT_UID: AtomicI32 = AtomicI32::new(FIRST_UID);
static OBJECT_LIMIT: AtomicUsize = AtomicUsize::new(DEFAULT_OBJECT_LIMIT);

/// A live kernel object.
#[derive(Clone)]
pub(crate) enum Object {
    Sema(Arc<SemaObject>),
    Thread(Arc<ThreadObject>),
}

/// The object table has no room for another object.
#[derive(Debug, thiserror::Error)]
#[error("Kernel object table full")]
pub(crate) struct TableFull;

/// Sets the capacity of the object table.
///
/// Lowering the limit below the number of live objects does not destroy anything; it
/// only makes every subsequent creation fail until enough objects are deleted.
pub fn set_object_limit(limit: usize) {
    OBJECT_LIMIT.store(limit, Ordering::Release);
}

/// Returns the capacity of the object table.
pub fn object_limit() -> usize {
    OBJECT_LIMIT.load(Ordering::Acquire)
}

/// Returns the number of live kernel objects.
pub fn object_count() -> usize {
    OBJECTS.lock().len()
}

/// Inserts `object` and returns its new UID, honouring the object limit.
pub(crate) fn insert(object: Object) -> Result<Uid, TableFull> {
    let mut objects = OBJECTS.lock();
    if objects.len() >= object_limit() {
        return Err(TableFull);
    }

    let uid = next_uid();
    objects.insert(uid, object);
    Ok(uid)
}

/// Inserts `object` regardless of the object limit.
pub(crate) fn insert_unbounded(object: Object) -> Uid {
    let uid = next_uid();
    OBJECTS.lock().insert(uid, object);
    uid
}

pub(crate) fn get_sema(uid: Uid) -> Option<Arc<SemaObject>> {
    match OBJECTS.lock().get(&uid) {
        Some(Object::Sema(sema)) => Some(Arc::clone(sema)),
        _ => None,
    }
}

pub(crate) fn get_thread(uid: Uid) -> Option<Arc<ThreadObject>> {
    match OBJECTS.lock().get(&uid) {
        Some(Object::Thread(thread)) => Some(Arc::clone(thread)),
        _ => None,
    }
}

/// Removes the semaphore named by `uid`. Objects of another kind are left untouched.
pub(crate) fn remove_sema(uid: Uid) -> Option<Arc<SemaObject>> {
    let mut objects = OBJECTS.lock();
    match objects.get(&uid) {
        Some(Object::Sema(_)) => match objects.remove(&uid) {
            Some(Object::Sema(sema)) => Some(sema),
            _ => None,
        },
        _ => None,
    }
}

/// Removes the thread named by `uid`. Objects of another kind are left untouched.
pub(crate) fn remove_thread(uid: Uid) -> Option<Arc<ThreadObject>> {
    let mut objects = OBJECTS.lock();
    match objects.get(&uid) {
        Some(Object::Thread(_)) => match objects.remove(&uid) {
            Some(Object::Thread(thread)) => Some(thread),
            _ => None,
        },
        _ => None,
    }
}

/// Allocates the next UID, skipping back to [`FIRST_UID`] instead of going negative.
fn next_uid() -> Uid {
    let prev = NEXT_UID.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |uid| {
        Some(if uid == Uid::MAX { FIRST_UID } else { uid + 1 })
    });

    // The closure never returns `None`
    match prev {
        Ok(uid) | Err(uid) => uid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uids_are_positive_and_distinct() {
        let a = next_uid();
        let b = next_uid();
        assert!(a > 0 && b > 0);
        assert_ne!(a, b);
    }
}
