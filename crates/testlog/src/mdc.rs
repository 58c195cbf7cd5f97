//! crates/testlog/src/mdc.rs
//! Per-thread diagnostic context (mapped diagnostic context, MDC).
//!
//! Every thread owns a private string map. Recorded events take a snapshot of
//! the calling thread's map, so later mutations never leak into events that
//! were already captured.
//!
//! Whether a spawned thread starts with a copy of its parent's map is decided
//! by [`MdcInheritance`]. Rust has no hook into `std::thread::spawn`, so the
//! copy happens only for threads started through [`spawn`] or closures wrapped
//! by [`propagate`]; under the default [`MdcInheritance::ThreadLocal`] those
//! helpers start the child with an empty map like any other thread.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

thread_local! {
    static CONTEXT: RefCell<BTreeMap<String, String>> = const { RefCell::new(BTreeMap::new()) };
}

static INHERIT_ON_SPAWN: AtomicBool = AtomicBool::new(false);

/// Controls whether [`spawn`] and [`propagate`] copy the parent's context.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum MdcInheritance {
    /// Every thread starts with an empty context.
    #[default]
    ThreadLocal,
    /// Threads started through [`spawn`]/[`propagate`] start with a snapshot of
    /// the spawning thread's context.
    InheritOnSpawn,
}

/// Selects the process-wide inheritance mode.
pub fn set_inheritance(mode: MdcInheritance) {
    INHERIT_ON_SPAWN.store(mode == MdcInheritance::InheritOnSpawn, Ordering::Release);
}

/// Returns the process-wide inheritance mode.
#[must_use]
pub fn inheritance() -> MdcInheritance {
    if INHERIT_ON_SPAWN.load(Ordering::Acquire) {
        MdcInheritance::InheritOnSpawn
    } else {
        MdcInheritance::ThreadLocal
    }
}

/// Stores `value` under `key` in the calling thread's context.
pub fn put(key: impl Into<String>, value: impl Into<String>) {
    let (key, value) = (key.into(), value.into());
    CONTEXT.with(|context| {
        context.borrow_mut().insert(key, value);
    });
}

/// Returns the value stored under `key` for the calling thread.
#[must_use]
pub fn get(key: &str) -> Option<String> {
    CONTEXT.with(|context| context.borrow().get(key).cloned())
}

/// Removes `key` from the calling thread's context, returning its value.
pub fn remove(key: &str) -> Option<String> {
    CONTEXT.with(|context| context.borrow_mut().remove(key))
}

/// Empties the calling thread's context.
pub fn clear() {
    CONTEXT.with(|context| context.borrow_mut().clear());
}

/// Returns the keys present in the calling thread's context.
#[must_use]
pub fn keys() -> BTreeSet<String> {
    CONTEXT.with(|context| context.borrow().keys().cloned().collect())
}

/// Returns a defensive copy of the calling thread's context.
#[must_use]
pub fn copy_of_context_map() -> BTreeMap<String, String> {
    CONTEXT.with(|context| context.borrow().clone())
}

/// Replaces the calling thread's context with a copy of `entries`.
pub fn set_context_map<I, K, V>(entries: I)
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let replacement: BTreeMap<String, String> = entries
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect();
    CONTEXT.with(|context| *context.borrow_mut() = replacement);
}

/// Stores `value` under `key` until the returned guard is dropped.
///
/// ```
/// use testlog::mdc;
///
/// {
///     let _request = mdc::put_scoped("request", "42");
///     assert_eq!(mdc::get("request").as_deref(), Some("42"));
/// }
/// assert_eq!(mdc::get("request"), None);
/// ```
#[must_use = "the entry is removed as soon as the guard is dropped"]
pub fn put_scoped(key: impl Into<String>, value: impl Into<String>) -> ScopedEntry {
    let key = key.into();
    put(key.clone(), value);
    ScopedEntry { key }
}

/// Guard returned by [`put_scoped`].
#[derive(Debug)]
pub struct ScopedEntry {
    key: String,
}

impl Drop for ScopedEntry {
    fn drop(&mut self) {
        // `try_with` because the guard may outlive the thread-local during
        // thread teardown.
        let _ = CONTEXT.try_with(|context| context.borrow_mut().remove(&self.key));
    }
}

/// Wraps `f` so that, under [`MdcInheritance::InheritOnSpawn`], it runs with a
/// copy of the context captured now.
///
/// Useful with thread pools or scoped threads that do not go through
/// [`spawn`].
pub fn propagate<F, T>(f: F) -> impl FnOnce() -> T + Send + 'static
where
    F: FnOnce() -> T + Send + 'static,
    T: 'static,
{
    let inherited = match inheritance() {
        MdcInheritance::InheritOnSpawn => Some(copy_of_context_map()),
        MdcInheritance::ThreadLocal => None,
    };
    move || {
        if let Some(context) = inherited {
            set_context_map(context);
        }
        f()
    }
}

/// Spawns a thread that honours the current [`MdcInheritance`] mode.
pub fn spawn<F, T>(f: F) -> JoinHandle<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    thread::spawn(propagate(f))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_remove_round_trip() {
        clear();
        put("user", "alice");
        assert_eq!(get("user").as_deref(), Some("alice"));
        assert_eq!(remove("user").as_deref(), Some("alice"));
        assert_eq!(get("user"), None);
    }

    #[test]
    fn missing_key_is_absent() {
        clear();
        assert_eq!(get("nope"), None);
        assert_eq!(remove("nope"), None);
    }

    #[test]
    fn copy_is_not_affected_by_later_writes() {
        clear();
        put("k", "before");
        let snapshot = copy_of_context_map();
        put("k", "after");
        assert_eq!(snapshot.get("k").map(String::as_str), Some("before"));
    }

    #[test]
    fn set_context_map_replaces_everything() {
        clear();
        put("old", "1");
        set_context_map([("new", "2")]);
        assert_eq!(keys().into_iter().collect::<Vec<_>>(), ["new"]);
    }

    #[test]
    fn other_threads_do_not_see_the_context() {
        clear();
        put("k", "v");
        let seen = thread::spawn(|| get("k")).join().unwrap();
        assert_eq!(seen, None);
    }

    #[test]
    fn scoped_entry_removes_key_on_drop() {
        clear();
        let guard = put_scoped("scope", "inner");
        assert_eq!(get("scope").as_deref(), Some("inner"));
        drop(guard);
        assert_eq!(get("scope"), None);
    }
}
