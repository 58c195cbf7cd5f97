//! crates/testlog/src/logger.rs
//! Named in-memory recorder with per-thread and global event views.

use std::error::Error;
use std::fmt::{self, Display};
use std::sync::{Arc, Mutex, RwLock, Weak};

use crate::event::{LoggingEvent, render_args};
use crate::factory::TestLoggerFactory;
use crate::level::{Level, LevelSet};
use crate::marker::{CapturedError, Marker};
use crate::mdc;
use crate::thread_local::{PerThread, lock, read, write};

/// The arguments of a single log call.
///
/// Every convenience method on [`TestLogger`] builds one of these and hands it
/// to [`TestLogger::log`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogCall {
    pub(crate) level: Level,
    pub(crate) marker: Option<Marker>,
    pub(crate) message: String,
    pub(crate) arguments: Vec<String>,
    pub(crate) error: Option<CapturedError>,
}

impl LogCall {
    /// Starts a call at `level` with a message template.
    #[must_use]
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            marker: None,
            message: message.into(),
            arguments: Vec::new(),
            error: None,
        }
    }

    /// Sets the positional arguments, rendering each with `Display`.
    pub fn with_args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Display,
    {
        self.arguments = render_args(args);
        self
    }

    /// Appends one positional argument.
    pub fn with_arg(mut self, arg: impl Display) -> Self {
        self.arguments.push(arg.to_string());
        self
    }

    /// Attaches a marker.
    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.marker = Some(marker);
        self
    }

    /// Attaches a snapshot of `error`.
    pub fn with_error<E: Error + ?Sized>(mut self, error: &E) -> Self {
        self.error = Some(CapturedError::from_error(error));
        self
    }

    /// Attaches an already captured error.
    pub fn with_captured_error(mut self, error: CapturedError) -> Self {
        self.error = Some(error);
        self
    }

    /// Severity of the call.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }
}

/// In-memory logger that records every enabled call.
///
/// Events are kept twice. [`logging_events`](Self::logging_events) and
/// [`clear`](Self::clear) only see the calling thread, so tests running in
/// parallel on the same logger do not interfere.
/// [`all_logging_events`](Self::all_logging_events) and
/// [`clear_all`](Self::clear_all) cover every thread.
///
/// All levels are enabled by default. Levels are not hierarchical: enabling
/// `INFO` does not enable `WARN` or `ERROR`, so every wanted level must be
/// listed explicitly.
///
/// Loggers are created by [`TestLoggerFactory::get_logger`].
pub struct TestLogger {
    name: String,
    this: Weak<TestLogger>,
    factory: Weak<TestLoggerFactory>,
    local_events: PerThread<Vec<LoggingEvent>>,
    all_events: Mutex<Vec<LoggingEvent>>,
    enabled_levels: PerThread<LevelSet>,
    // Enabled levels for threads that have not chosen their own.
    default_levels: RwLock<LevelSet>,
}

macro_rules! level_methods {
    ($($level:expr => $is_enabled:ident, $plain:ident, $with_args:ident, $with_cause:ident;)+) => {
        $(
            #[doc = concat!("Returns `true` if `", stringify!($level), "` is enabled for the calling thread.")]
            #[must_use]
            pub fn $is_enabled(&self) -> bool {
                self.is_enabled($level)
            }

            #[doc = concat!("Records a `", stringify!($level), "` call with a plain message.")]
            pub fn $plain(&self, message: impl Into<String>) {
                self.log(LogCall::new($level, message));
            }

            #[doc = concat!("Records a `", stringify!($level), "` call with positional arguments.")]
            pub fn $with_args<I>(&self, message: impl Into<String>, args: I)
            where
                I: IntoIterator,
                I::Item: Display,
            {
                self.log(LogCall::new($level, message).with_args(args));
            }

            #[doc = concat!("Records a `", stringify!($level), "` call with an attached error.")]
            pub fn $with_cause<E: Error + ?Sized>(&self, message: impl Into<String>, error: &E) {
                self.log(LogCall::new($level, message).with_error(error));
            }
        )+
    };
}

impl TestLogger {
    pub(crate) fn new(name: &str, factory: Weak<TestLoggerFactory>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            name: name.to_owned(),
            this: this.clone(),
            factory,
            local_events: PerThread::new(),
            all_events: Mutex::new(Vec::new()),
            enabled_levels: PerThread::new(),
            default_levels: RwLock::new(LevelSet::all()),
        })
    }

    /// The name this logger was registered under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if `level` is in the calling thread's enabled set.
    #[must_use]
    pub fn is_enabled(&self, level: Level) -> bool {
        self.enabled_levels().contains(level)
    }

    level_methods! {
        Level::Trace => is_trace_enabled, trace, trace_with, trace_with_cause;
        Level::Debug => is_debug_enabled, debug, debug_with, debug_with_cause;
        Level::Info => is_info_enabled, info, info_with, info_with_cause;
        Level::Warn => is_warn_enabled, warn, warn_with, warn_with_cause;
        Level::Error => is_error_enabled, error, error_with, error_with_cause;
    }

    /// Records a call tagged with `marker`.
    pub fn log_with_marker<I>(
        &self,
        level: Level,
        marker: Marker,
        message: impl Into<String>,
        args: I,
    ) where
        I: IntoIterator,
        I::Item: Display,
    {
        self.log(LogCall::new(level, message).with_marker(marker).with_args(args));
    }

    /// Records `call` if its level is enabled for the calling thread.
    ///
    /// The event captures a snapshot of the calling thread's [`mdc`] context.
    /// It is appended to this thread's list, to the logger's global list and
    /// to the factory's aggregates, then echoed if it meets the factory's
    /// print level. Disabled calls leave no trace.
    pub fn log(&self, call: LogCall) {
        if !self.is_enabled(call.level) {
            return;
        }

        let event = LoggingEvent::recorded(call, self.this.clone(), mdc::copy_of_context_map());
        self.local_events
            .with_mut(Vec::new, |events| events.push(event.clone()));
        lock(&self.all_events).push(event.clone());

        if let Some(factory) = self.factory.upgrade() {
            factory.add_logging_event(&event);
            if factory.should_print(event.level()) {
                event.print();
            }
        }
    }

    /// Events recorded on this logger by the calling thread, oldest first.
    #[must_use]
    pub fn logging_events(&self) -> Vec<LoggingEvent> {
        self.local_events.get_or(Vec::new)
    }

    /// Events recorded on this logger by any thread, in append order.
    #[must_use]
    pub fn all_logging_events(&self) -> Vec<LoggingEvent> {
        lock(&self.all_events).clone()
    }

    /// Drops the calling thread's events and re-enables every level for it.
    ///
    /// Other threads and the global list are untouched.
    pub fn clear(&self) {
        self.local_events.remove_current();
        if *read(&self.default_levels) == LevelSet::all() {
            self.enabled_levels.remove_current();
        } else {
            self.enabled_levels.set(LevelSet::all());
        }
    }

    /// Drops every event on this logger and re-enables every level, for all
    /// threads.
    pub fn clear_all(&self) {
        lock(&self.all_events).clear();
        self.local_events.clear();
        *write(&self.default_levels) = LevelSet::all();
        self.enabled_levels.clear();
    }

    /// The levels enabled for the calling thread.
    #[must_use]
    pub fn enabled_levels(&self) -> LevelSet {
        self.enabled_levels.get_or(|| *read(&self.default_levels))
    }

    /// Replaces the enabled levels for the calling thread only.
    ///
    /// List every level that should record; no level implies another.
    pub fn set_enabled_levels(&self, levels: impl IntoIterator<Item = Level>) {
        self.enabled_levels.set(levels.into_iter().collect());
    }

    /// Replaces the enabled levels for every thread, current and future.
    pub fn set_enabled_levels_for_all_threads(&self, levels: impl IntoIterator<Item = Level>) {
        *write(&self.default_levels) = levels.into_iter().collect();
        self.enabled_levels.clear();
    }
}

impl fmt::Debug for TestLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestLogger")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
