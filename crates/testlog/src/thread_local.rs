//! crates/testlog/src/thread_local.rs
//! Thread-keyed storage for captured events and enabled levels.
//!
//! A `std::thread_local!` static cannot be created per logger, and it cannot be
//! discarded for every thread at once. [`PerThread`] instead keys each value by
//! the calling thread's [`ThreadId`] inside a [`DashMap`], so resetting "all
//! threads" is a single `clear` and other threads observe fresh state on their
//! next access.
//!
//! Entries of exited threads stay in the map until an all-threads clear.
//! Owners remove the calling thread's entry whenever it would only hold the
//! initial value again, so per-test resets do not accumulate entries.

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread::{self, ThreadId};

use dashmap::DashMap;

/// Per-thread values owned by a single logger or factory.
#[derive(Debug)]
pub(crate) struct PerThread<T> {
    cells: DashMap<ThreadId, T>,
}

impl<T> PerThread<T> {
    pub(crate) fn new() -> Self {
        Self {
            cells: DashMap::new(),
        }
    }

    /// Runs `op` on the calling thread's value, creating it with `init` first
    /// if this thread has none.
    pub(crate) fn with_mut<R>(&self, init: impl FnOnce() -> T, op: impl FnOnce(&mut T) -> R) -> R {
        let mut cell = self.cells.entry(current()).or_insert_with(init);
        op(cell.value_mut())
    }

    /// Replaces the calling thread's value.
    pub(crate) fn set(&self, value: T) {
        self.cells.insert(current(), value);
    }

    /// Drops the calling thread's value; the next access starts from `init`.
    pub(crate) fn remove_current(&self) {
        self.cells.remove(&current());
    }

    /// Drops the values of every thread.
    pub(crate) fn clear(&self) {
        self.cells.clear();
    }

    /// Returns `true` if the calling thread has a stored value.
    #[cfg(test)]
    pub(crate) fn contains_current(&self) -> bool {
        self.cells.contains_key(&current())
    }
}

impl<T: Clone> PerThread<T> {
    /// Returns a copy of the calling thread's value, or `init()` without
    /// storing it when the thread has none yet.
    pub(crate) fn get_or(&self, init: impl FnOnce() -> T) -> T {
        self.cells
            .get(&current())
            .map_or_else(init, |cell| cell.value().clone())
    }
}

impl<T> Default for PerThread<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn current() -> ThreadId {
    thread::current().id()
}

// A test that panics while holding one of these locks must not poison the
// recorder for every later test, so poisoned guards are recovered.

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poison| poison.into_inner())
}

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poison| poison.into_inner())
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poison| poison.into_inner())
}
