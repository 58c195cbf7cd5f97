//! Integration tests for context inheritance across spawned threads.
//!
//! The inheritance mode is process-wide, so every test here takes
//! [`MODE_LOCK`] and restores the default before releasing it.

use std::sync::{Mutex, MutexGuard};
use std::thread;

use testlog::{LoggingEvent, MdcInheritance, TestLoggerFactory, mdc};

static MODE_LOCK: Mutex<()> = Mutex::new(());

struct ModeGuard {
    _lock: MutexGuard<'static, ()>,
}

impl ModeGuard {
    fn set(mode: MdcInheritance) -> Self {
        let lock = MODE_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        mdc::set_inheritance(mode);
        mdc::clear();
        Self { _lock: lock }
    }
}

impl Drop for ModeGuard {
    fn drop(&mut self) {
        mdc::set_inheritance(MdcInheritance::default());
        mdc::clear();
    }
}

// ============================================================================
// Thread-Local Mode
// ============================================================================

/// Verifies thread-local mode is the default.
#[test]
fn thread_local_is_default() {
    let _mode = ModeGuard::set(MdcInheritance::default());
    assert_eq!(mdc::inheritance(), MdcInheritance::ThreadLocal);
}

/// Verifies children start empty in thread-local mode, even via `mdc::spawn`.
#[test]
fn thread_local_children_start_empty() {
    let _mode = ModeGuard::set(MdcInheritance::ThreadLocal);
    mdc::put("k", "parent");

    let via_std = thread::spawn(|| mdc::get("k")).join().unwrap();
    let via_helper = mdc::spawn(|| mdc::get("k")).join().unwrap();

    assert_eq!(via_std, None);
    assert_eq!(via_helper, None);
    assert_eq!(mdc::get("k").as_deref(), Some("parent"));
}

// ============================================================================
// Inherit-On-Spawn Mode
// ============================================================================

/// Verifies spawned children start with a copy of the parent's context.
#[test]
fn inherit_mode_copies_parent_context() {
    let _mode = ModeGuard::set(MdcInheritance::InheritOnSpawn);
    mdc::put("request", "42");

    let child = mdc::spawn(|| {
        let inherited = mdc::get("request");
        mdc::put("request", "child");
        inherited
    })
    .join()
    .unwrap();

    assert_eq!(child.as_deref(), Some("42"));
    assert_eq!(mdc::get("request").as_deref(), Some("42"));
}

/// Verifies the copy is taken at spawn time, not at first access.
#[test]
fn inherit_mode_snapshots_at_spawn() {
    let _mode = ModeGuard::set(MdcInheritance::InheritOnSpawn);
    mdc::put("phase", "before");

    let task = mdc::propagate(|| mdc::get("phase"));
    mdc::put("phase", "after");

    assert_eq!(thread::spawn(task).join().unwrap().as_deref(), Some("before"));
}

/// Verifies plain `std::thread::spawn` never inherits.
#[test]
fn inherit_mode_does_not_affect_std_spawn() {
    let _mode = ModeGuard::set(MdcInheritance::InheritOnSpawn);
    mdc::put("k", "v");
    assert_eq!(thread::spawn(|| mdc::get("k")).join().unwrap(), None);
}

/// Verifies events recorded by an inheriting child carry the inherited context.
#[test]
fn inherited_context_is_recorded_on_events() {
    let _mode = ModeGuard::set(MdcInheritance::InheritOnSpawn);
    let factory = TestLoggerFactory::new(None);
    mdc::put("tenant", "acme");

    let logger = factory.get_logger("jobs");
    let events = mdc::spawn(move || {
        logger.info("job ran");
        logger.logging_events()
    })
    .join()
    .unwrap();

    assert_eq!(
        events,
        [LoggingEvent::info("job ran").with_mdc([("tenant", "acme")])]
    );
}
