//! Slot-table arena and thread bindings.

use alloc::{collections::BTreeMap, sync::Arc, vec::Vec};
use core::fmt;

use pte_svc::Uid;
use spin::{Mutex, Once};

use crate::{TlsError, key, key::SlotKey, table::SlotTable};

static ARENA: Mutex<Arena> = Mutex::new(Arena::new());
static AMBIENT: Once<TableId> = Once::new();

/// Stable identifier of a slot table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct TableId(usize);

impl TableId {
    /// Converts a raw arena index to a [`TableId`].
    pub const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    /// Converts the [`TableId`] to a raw arena index.
    pub const fn to_raw(self) -> usize {
        self.0
    }
}

impl fmt::LowerHex for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

struct Arena {
    tables: Vec<Option<Arc<SlotTable>>>,
    free_ids: Vec<usize>,
    bindings: BTreeMap<Uid, TableId>,
    live: usize,
}

impl Arena {
    const fn new() -> Self {
        Self {
            tables: Vec::new(),
            free_ids: Vec::new(),
            bindings: BTreeMap::new(),
            live: 0,
        }
    }

    fn insert(&mut self) -> Result<TableId, TlsError> {
        let table = Some(Arc::new(SlotTable::new()));

        let index = match self.free_ids.pop() {
            Some(index) => {
                self.tables[index] = table;
                index
            }
            None => {
                self.tables
                    .try_reserve(1)
                    .map_err(|_| TlsError::OutOfMemory)?;
                // Keep room to recycle this id without allocating on release
                self.free_ids
                    .try_reserve(self.tables.len() + 1 - self.free_ids.len())
                    .map_err(|_| TlsError::OutOfMemory)?;
                self.tables.push(table);
                self.tables.len() - 1
            }
        };

        self.live += 1;
        Ok(TableId(index))
    }

    fn remove(&mut self, id: TableId) -> Result<(), TlsError> {
        match self.tables.get_mut(id.0) {
            Some(slot @ Some(_)) => *slot = None,
            _ => return Err(TlsError::InvalidTable),
        }

        self.bindings.retain(|_, bound| *bound != id);
        self.free_ids.push(id.0);
        self.live -= 1;
        Ok(())
    }

    fn get(&self, id: TableId) -> Option<Arc<SlotTable>> {
        self.tables.get(id.0)?.clone()
    }
}

/// Sets the key-pool limit to `min(max_slots, MAX_SLOTS)` and creates the ambient table.
///
/// Only the first call has an effect.
pub fn global_init(max_slots: u32) -> Result<(), TlsError> {
    AMBIENT.try_call_once(|| -> Result<TableId, TlsError> {
        key::set_limit(max_slots);
        let id = ARENA.lock().insert()?;
        log::debug!("tls: initialized, {} keys, ambient table {id:x}", key::key_limit());
        Ok(id)
    })?;
    Ok(())
}

/// Returns the id of the ambient table shared by every unbound thread.
pub fn ambient_table() -> Result<TableId, TlsError> {
    AMBIENT.get().copied().ok_or(TlsError::NotInitialized)
}

/// Creates a new, empty slot table for a managed thread.
pub fn thread_init() -> Result<TableId, TlsError> {
    ambient_table()?;
    ARENA.lock().insert()
}

/// Destroys a slot table created by [`thread_init`], dropping every binding to it.
///
/// The ambient table cannot be destroyed.
pub fn thread_destroy(id: TableId) -> Result<(), TlsError> {
    if ambient_table()? == id {
        return Err(TlsError::InvalidTable);
    }
    ARENA.lock().remove(id)
}

/// Binds the kernel thread `thread` to `table`, replacing any previous binding.
pub fn bind(thread: Uid, table: TableId) -> Result<(), TlsError> {
    let mut arena = ARENA.lock();
    if arena.get(table).is_none() {
        return Err(TlsError::InvalidTable);
    }

    arena.bindings.insert(thread, table);
    Ok(())
}

/// Removes the binding of `thread` and returns the table it was bound to.
pub fn unbind(thread: Uid) -> Option<TableId> {
    ARENA.lock().bindings.remove(&thread)
}

/// Returns the table bound to `thread`, if any.
pub fn binding(thread: Uid) -> Option<TableId> {
    ARENA.lock().bindings.get(&thread).copied()
}

/// Returns the table bound to `thread`, or the ambient table for unbound threads.
pub fn resolve(thread: Uid) -> Result<TableId, TlsError> {
    match binding(thread) {
        Some(id) => Ok(id),
        None => ambient_table(),
    }
}

/// Returns the number of live tables, the ambient table included.
pub fn live_tables() -> usize {
    ARENA.lock().live
}

pub(crate) fn table(id: TableId) -> Result<Arc<SlotTable>, TlsError> {
    ARENA.lock().get(id).ok_or(TlsError::InvalidTable)
}

/// Resets the slot named by `key` in every live table.
pub(crate) fn clear_slot(key: SlotKey) {
    let arena = ARENA.lock();
    for table in arena.tables.iter().flatten() {
        table.clear(key);
    }
}
