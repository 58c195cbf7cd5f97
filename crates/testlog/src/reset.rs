//! crates/testlog/src/reset.rs
//! RAII guards that reset captured state around a test.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::factory::TestLoggerFactory;
use crate::thread_local::lock;

static EXCLUSIVE: Mutex<()> = Mutex::new(());

/// Clears the calling thread's state on creation and again on drop.
///
/// Only the current thread's events and enabled levels are touched, so tests
/// running in parallel can each hold one. Events in the global views are
/// kept. The drop also runs while a failing test unwinds.
///
/// ```
/// use testlog::ThreadResetGuard;
///
/// let _reset = ThreadResetGuard::new();
/// testlog::test_logger("checkout").info("started");
/// assert_eq!(testlog::test_logger("checkout").logging_events().len(), 1);
/// ```
#[derive(Debug)]
#[must_use = "state is cleared again when the guard is dropped"]
pub struct ThreadResetGuard {
    factory: Arc<TestLoggerFactory>,
}

impl ThreadResetGuard {
    /// Guards the process-wide registry.
    ///
    /// # Panics
    ///
    /// Panics if the `testlog` configuration is invalid.
    pub fn new() -> Self {
        Self::with_factory(TestLoggerFactory::instance())
    }

    /// Guards `factory`.
    pub fn with_factory(factory: Arc<TestLoggerFactory>) -> Self {
        factory.clear_loggers();
        Self { factory }
    }
}

impl Default for ThreadResetGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ThreadResetGuard {
    fn drop(&mut self) {
        self.factory.clear_loggers();
    }
}

/// Runs a test alone and resets the whole registry around it.
///
/// Holding the guard blocks every other `ExclusiveResetGuard` in the process.
/// The registry is [`reset`](TestLoggerFactory::reset) on creation and on
/// drop, so assertions on the global views see only this test's events.
#[derive(Debug)]
#[must_use = "the registry is released as soon as the guard is dropped"]
pub struct ExclusiveResetGuard {
    factory: Arc<TestLoggerFactory>,
    _exclusive: MutexGuard<'static, ()>,
}

impl ExclusiveResetGuard {
    /// Guards the process-wide registry.
    ///
    /// # Panics
    ///
    /// Panics if the `testlog` configuration is invalid.
    pub fn new() -> Self {
        Self::with_factory(TestLoggerFactory::instance())
    }

    /// Guards `factory`, still serialised with every other exclusive guard.
    pub fn with_factory(factory: Arc<TestLoggerFactory>) -> Self {
        let exclusive = lock(&EXCLUSIVE);
        factory.reset();
        Self {
            factory,
            _exclusive: exclusive,
        }
    }
}

impl Default for ExclusiveResetGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ExclusiveResetGuard {
    fn drop(&mut self) {
        // Runs before `_exclusive` is released.
        self.factory.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{Level, LevelSet};
    use std::panic;
    use std::thread;

    #[test]
    fn thread_guard_clears_on_entry_and_exit() {
        let factory = TestLoggerFactory::new(None);
        let logger = factory.get_logger("a");
        logger.info("stale");
        logger.set_enabled_levels([Level::Error]);

        let guard = ThreadResetGuard::with_factory(Arc::clone(&factory));
        assert!(logger.logging_events().is_empty());
        assert_eq!(logger.enabled_levels(), LevelSet::all());

        logger.warn("during");
        drop(guard);
        assert!(logger.logging_events().is_empty());
        assert_eq!(logger.all_logging_events().len(), 2);
    }

    #[test]
    fn thread_guard_leaves_other_threads_alone() {
        let factory = TestLoggerFactory::new(None);
        let remote = Arc::clone(&factory);
        let (ready_tx, ready_rx) = std::sync::mpsc::channel();
        let (done_tx, done_rx) = std::sync::mpsc::channel::<()>();
        let worker = thread::spawn(move || {
            remote.get_logger("a").info("other thread");
            ready_tx.send(()).unwrap();
            done_rx.recv().unwrap();
            remote.get_logger("a").logging_events().len()
        });

        ready_rx.recv().unwrap();
        drop(ThreadResetGuard::with_factory(Arc::clone(&factory)));
        done_tx.send(()).unwrap();
        assert_eq!(worker.join().unwrap(), 1);
    }

    #[test]
    fn thread_guard_clears_when_test_panics() {
        let factory = TestLoggerFactory::new(None);
        let logger = factory.get_logger("a");
        let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
            let _guard = ThreadResetGuard::with_factory(Arc::clone(&factory));
            logger.error("before failure");
            panic!("assertion failed");
        }));

        assert!(result.is_err());
        assert!(logger.logging_events().is_empty());
    }

    #[test]
    fn exclusive_guard_resets_registry() {
        let factory = TestLoggerFactory::new(None);
        let before = factory.get_logger("a");
        before.info("stale");

        {
            let _guard = ExclusiveResetGuard::with_factory(Arc::clone(&factory));
            assert!(factory.all_loggers().is_empty());
            factory.get_logger("b").info("inside");
        }

        assert!(factory.all_loggers().is_empty());
        assert!(factory.all_logging_events().is_empty());
    }
}
