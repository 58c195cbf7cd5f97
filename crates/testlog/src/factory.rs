//! crates/testlog/src/factory.rs
//! Registry of test loggers and cross-logger event aggregation.

use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, RwLock, Weak};

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::config::{OverridableProperties, SOURCE_NAME};
use crate::error::ConfigError;
use crate::event::LoggingEvent;
use crate::level::Level;
use crate::logger::TestLogger;
use crate::thread_local::{PerThread, lock, read, write};

static INSTANCE: OnceLock<Result<Arc<TestLoggerFactory>, ConfigError>> = OnceLock::new();

/// Owns every [`TestLogger`] by name and aggregates their events.
///
/// The process-wide instance is reached through [`instance`](Self::instance)
/// or the crate-level shortcuts such as [`test_logger`](crate::test_logger).
/// Private registries built with [`new`](Self::new) behave identically and
/// are handy when a test must not share state with anything else.
pub struct TestLoggerFactory {
    this: Weak<TestLoggerFactory>,
    loggers: DashMap<String, Arc<TestLogger>>,
    local_events: PerThread<Vec<LoggingEvent>>,
    all_events: Mutex<Vec<LoggingEvent>>,
    print_level: RwLock<Option<Level>>,
}

impl TestLoggerFactory {
    /// Creates an empty registry that echoes events at or above `print_level`.
    #[must_use]
    pub fn new(print_level: Option<Level>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            loggers: DashMap::new(),
            local_events: PerThread::new(),
            all_events: Mutex::new(Vec::new()),
            print_level: RwLock::new(print_level),
        })
    }

    /// Creates a registry whose print level comes from `properties`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPrintLevel`] if the configured value is
    /// not a level name or `OFF`.
    pub fn from_properties(properties: &OverridableProperties) -> Result<Arc<Self>, ConfigError> {
        let print_level = properties.print_level()?;
        debug!(?print_level, "created test logger factory");
        Ok(Self::new(print_level))
    }

    /// Returns the process-wide registry, building it from the `testlog`
    /// properties source on first access.
    ///
    /// The outcome of the first access is cached: a configuration error is
    /// returned again on every later call.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] raised while loading the configuration.
    pub fn try_instance() -> Result<Arc<Self>, ConfigError> {
        INSTANCE
            .get_or_init(|| {
                OverridableProperties::load(SOURCE_NAME)
                    .and_then(|properties| Self::from_properties(&properties))
            })
            .clone()
    }

    /// Returns the process-wide registry.
    ///
    /// # Panics
    ///
    /// Panics with the configuration error if the `testlog` properties are
    /// invalid. A broken test configuration cannot be recovered from.
    #[must_use]
    pub fn instance() -> Arc<Self> {
        match Self::try_instance() {
            Ok(factory) => factory,
            Err(err) => panic!("testlog configuration error: {err}"),
        }
    }

    /// Returns the logger registered under `name`, creating it on first use.
    ///
    /// Concurrent callers asking for the same new name all receive the same
    /// instance.
    #[must_use]
    pub fn get_logger(&self, name: &str) -> Arc<TestLogger> {
        if let Some(existing) = self.loggers.get(name) {
            return Arc::clone(existing.value());
        }

        let mut created = false;
        let logger = Arc::clone(
            self.loggers
                .entry(name.to_owned())
                .or_insert_with(|| {
                    created = true;
                    TestLogger::new(name, self.this.clone())
                })
                .value(),
        );
        if created {
            trace!(logger = name, "created test logger");
        }
        logger
    }

    /// Returns the logger named after the type `T`, as `tracing` targets are
    /// named after module paths.
    #[must_use]
    pub fn get_logger_for<T: ?Sized>(&self) -> Arc<TestLogger> {
        self.get_logger(type_name::<T>())
    }

    /// Snapshot of every registered logger by name.
    #[must_use]
    pub fn all_loggers(&self) -> HashMap<String, Arc<TestLogger>> {
        self.loggers
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect()
    }

    /// Events recorded by the calling thread on any of this registry's
    /// loggers, in append order.
    #[must_use]
    pub fn logging_events(&self) -> Vec<LoggingEvent> {
        self.local_events.get_or(Vec::new)
    }

    /// Events recorded by any thread on any of this registry's loggers, in
    /// append order.
    #[must_use]
    pub fn all_logging_events(&self) -> Vec<LoggingEvent> {
        lock(&self.all_events).clone()
    }

    /// Clears the calling thread's state on every logger and in the
    /// registry's own per-thread list.
    pub fn clear_loggers(&self) {
        for logger in self.logger_snapshot() {
            logger.clear();
        }
        self.local_events.remove_current();
    }

    /// Clears every logger for all threads and empties both aggregates.
    pub fn clear_all_loggers(&self) {
        for logger in self.logger_snapshot() {
            logger.clear_all();
        }
        self.local_events.clear();
        lock(&self.all_events).clear();
    }

    /// Clears everything and forgets every logger.
    ///
    /// Loggers handed out before the reset stay usable but are no longer
    /// returned by [`get_logger`](Self::get_logger).
    pub fn reset(&self) {
        self.clear_all_loggers();
        self.loggers.clear();
        debug!("reset test logger factory");
    }

    /// Sets the process-wide echo threshold; `None` disables echoing.
    pub fn set_print_level(&self, level: Option<Level>) {
        *write(&self.print_level) = level;
    }

    /// The current echo threshold.
    #[must_use]
    pub fn print_level(&self) -> Option<Level> {
        *read(&self.print_level)
    }

    /// Returns `true` if an event at `level` is echoed under the current
    /// threshold, that is when a threshold is set and `level` is at or above
    /// it.
    #[must_use]
    pub fn should_print(&self, level: Level) -> bool {
        self.print_level()
            .is_some_and(|threshold| level >= threshold)
    }

    pub(crate) fn add_logging_event(&self, event: &LoggingEvent) {
        self.local_events
            .with_mut(Vec::new, |events| events.push(event.clone()));
        lock(&self.all_events).push(event.clone());
    }

    // Iterating the map while a logger clears would hold shard locks across
    // the call, so work on a copy.
    fn logger_snapshot(&self) -> Vec<Arc<TestLogger>> {
        self.loggers
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }
}

impl fmt::Debug for TestLoggerFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestLoggerFactory")
            .field("loggers", &self.loggers.len())
            .field("print_level", &self.print_level())
            .finish_non_exhaustive()
    }
}

/// Returns the process-wide logger named `name`.
///
/// # Panics
///
/// Panics if the `testlog` configuration is invalid, see
/// [`TestLoggerFactory::instance`].
#[must_use]
pub fn test_logger(name: &str) -> Arc<TestLogger> {
    TestLoggerFactory::instance().get_logger(name)
}

/// Returns the process-wide logger named after the type `T`.
#[must_use]
pub fn test_logger_for<T: ?Sized>() -> Arc<TestLogger> {
    TestLoggerFactory::instance().get_logger_for::<T>()
}

/// Snapshot of every process-wide logger by name.
#[must_use]
pub fn all_test_loggers() -> HashMap<String, Arc<TestLogger>> {
    TestLoggerFactory::instance().all_loggers()
}

/// Events the calling thread recorded on any process-wide logger.
#[must_use]
pub fn logging_events() -> Vec<LoggingEvent> {
    TestLoggerFactory::instance().logging_events()
}

/// Events any thread recorded on any process-wide logger.
#[must_use]
pub fn all_logging_events() -> Vec<LoggingEvent> {
    TestLoggerFactory::instance().all_logging_events()
}

/// Clears the calling thread's state on every process-wide logger.
pub fn clear() {
    TestLoggerFactory::instance().clear_loggers();
}

/// Clears every process-wide logger for all threads.
pub fn clear_all() {
    TestLoggerFactory::instance().clear_all_loggers();
}

/// Clears and forgets every process-wide logger.
pub fn reset() {
    TestLoggerFactory::instance().reset();
}

/// Sets the process-wide echo threshold.
pub fn set_print_level(level: Option<Level>) {
    TestLoggerFactory::instance().set_print_level(level);
}

/// The process-wide echo threshold.
#[must_use]
pub fn print_level() -> Option<Level> {
    TestLoggerFactory::instance().print_level()
}
