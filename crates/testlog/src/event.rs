//! crates/testlog/src/event.rs
//! Immutable records of accepted log calls.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{self, Display};
use std::io::{self, Write};
use std::sync::{Arc, Weak};
use std::thread;

use crate::level::Level;
use crate::logger::{LogCall, TestLogger};
use crate::marker::{CapturedError, Marker};
use crate::message::format_message;

/// One recorded log call.
///
/// Events are reference counted: the per-thread list, the logger's global list
/// and the factory's aggregates all share the same allocation, and cloning an
/// event is cheap. Nothing mutates an event once it is recorded; the `with_*`
/// builders consume the value and return a new one.
///
/// Equality compares level, message template, arguments, marker, error and
/// context snapshot. The originating logger and thread are ignored, so
/// expectations can be built with the per-level constructors. Arguments are
/// kept as their `Display` rendering, so `with_args([1])` equals
/// `with_args(["1"])`.
///
/// ```
/// use testlog::{LoggingEvent, TestLoggerFactory};
///
/// let factory = TestLoggerFactory::new(None);
/// let logger = factory.get_logger("orders");
/// logger.info_with("placed order {}", [17]);
///
/// assert_eq!(
///     logger.logging_events(),
///     [LoggingEvent::info("placed order {}").with_args([17])]
/// );
/// ```
#[derive(Clone)]
pub struct LoggingEvent {
    inner: Arc<EventData>,
}

#[derive(Clone)]
struct EventData {
    level: Level,
    logger: Option<Weak<TestLogger>>,
    thread_name: String,
    mdc: BTreeMap<String, String>,
    marker: Option<Marker>,
    error: Option<CapturedError>,
    message: String,
    arguments: Vec<String>,
}

macro_rules! level_constructors {
    ($($(#[$doc:meta])* $name:ident => $level:expr;)+) => {
        $(
            $(#[$doc])*
            #[must_use]
            pub fn $name(message: impl Into<String>) -> Self {
                Self::new($level, message)
            }
        )+
    };
}

impl LoggingEvent {
    /// Creates an event with no logger, context, marker, error or arguments.
    #[must_use]
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(EventData {
                level,
                logger: None,
                thread_name: current_thread_name(),
                mdc: BTreeMap::new(),
                marker: None,
                error: None,
                message: message.into(),
                arguments: Vec::new(),
            }),
        }
    }

    level_constructors! {
        /// Creates a `TRACE` event.
        trace => Level::Trace;
        /// Creates a `DEBUG` event.
        debug => Level::Debug;
        /// Creates an `INFO` event.
        info => Level::Info;
        /// Creates a `WARN` event.
        warn => Level::Warn;
        /// Creates an `ERROR` event.
        error => Level::Error;
    }

    pub(crate) fn recorded(
        call: LogCall,
        logger: Weak<TestLogger>,
        mdc: BTreeMap<String, String>,
    ) -> Self {
        let LogCall {
            level,
            marker,
            message,
            arguments,
            error,
        } = call;
        Self {
            inner: Arc::new(EventData {
                level,
                logger: Some(logger),
                thread_name: current_thread_name(),
                mdc,
                marker,
                error,
                message,
                arguments,
            }),
        }
    }

    fn data_mut(&mut self) -> &mut EventData {
        Arc::make_mut(&mut self.inner)
    }

    /// Replaces the positional arguments, rendering each with `Display`.
    pub fn with_args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Display,
    {
        self.data_mut().arguments = render_args(args);
        self
    }

    /// Attaches a marker.
    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.data_mut().marker = Some(marker);
        self
    }

    /// Attaches a snapshot of `error`.
    pub fn with_error<E: Error + ?Sized>(mut self, error: &E) -> Self {
        self.data_mut().error = Some(CapturedError::from_error(error));
        self
    }

    /// Attaches an already captured error.
    pub fn with_captured_error(mut self, error: CapturedError) -> Self {
        self.data_mut().error = Some(error);
        self
    }

    /// Replaces the context snapshot.
    pub fn with_mdc<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.data_mut().mdc = entries
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        self
    }

    /// Severity of the call.
    #[must_use]
    pub fn level(&self) -> Level {
        self.inner.level
    }

    /// The logger that recorded the event, while it is still registered.
    #[must_use]
    pub fn creating_logger(&self) -> Option<Arc<TestLogger>> {
        self.inner.logger.as_ref().and_then(Weak::upgrade)
    }

    /// Name of the thread that created the event, or its id when unnamed.
    #[must_use]
    pub fn thread_name(&self) -> &str {
        &self.inner.thread_name
    }

    /// Context snapshot taken when the event was recorded.
    #[must_use]
    pub fn mdc(&self) -> &BTreeMap<String, String> {
        &self.inner.mdc
    }

    /// Attached marker, if any.
    #[must_use]
    pub fn marker(&self) -> Option<&Marker> {
        self.inner.marker.as_ref()
    }

    /// Attached error, if any.
    #[must_use]
    pub fn captured_error(&self) -> Option<&CapturedError> {
        self.inner.error.as_ref()
    }

    /// Unformatted message template.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.inner.message
    }

    /// Positional arguments as rendered at record time.
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.inner.arguments
    }

    /// Message with the arguments substituted into its placeholders.
    #[must_use]
    pub fn formatted_message(&self) -> String {
        format_message(&self.inner.message, &self.inner.arguments)
    }

    /// Echoes the event for the calling thread: `WARN` and `ERROR` go to
    /// stderr, everything else to stdout. Write failures are ignored.
    pub fn print(&self) {
        let _ = match self.level() {
            Level::Warn | Level::Error => self.print_to(&mut io::stderr().lock()),
            Level::Trace | Level::Debug | Level::Info => self.print_to(&mut io::stdout().lock()),
        };
    }

    /// Writes `[thread] LEVEL logger - message`, followed by the attached error
    /// and its causes, to `writer`. The thread is the one that created the
    /// event, not the one printing it.
    pub fn print_to<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        let logger = self
            .creating_logger()
            .map(|logger| format!(" {}", logger.name()))
            .unwrap_or_default();
        writeln!(
            writer,
            "[{}] {}{} - {}",
            self.thread_name(),
            self.level(),
            logger,
            self.formatted_message()
        )?;
        if let Some(error) = self.captured_error() {
            writeln!(writer, "{error}")?;
            for cause in error.causes() {
                writeln!(writer, "Caused by: {cause}")?;
            }
        }
        Ok(())
    }
}

impl PartialEq for LoggingEvent {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return true;
        }
        let (lhs, rhs) = (&*self.inner, &*other.inner);
        lhs.level == rhs.level
            && lhs.message == rhs.message
            && lhs.arguments == rhs.arguments
            && lhs.marker == rhs.marker
            && lhs.error == rhs.error
            && lhs.mdc == rhs.mdc
    }
}

impl Eq for LoggingEvent {}

impl fmt::Debug for LoggingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = &*self.inner;
        f.debug_struct("LoggingEvent")
            .field("level", &data.level)
            .field("thread_name", &data.thread_name)
            .field("message", &data.message)
            .field("arguments", &data.arguments)
            .field("marker", &data.marker)
            .field("error", &data.error)
            .field("mdc", &data.mdc)
            .finish_non_exhaustive()
    }
}

pub(crate) fn render_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: Display,
{
    args.into_iter().map(|arg| arg.to_string()).collect()
}

fn current_thread_name() -> String {
    let current = thread::current();
    current
        .name()
        .map_or_else(|| format!("{:?}", current.id()), str::to_owned)
}
