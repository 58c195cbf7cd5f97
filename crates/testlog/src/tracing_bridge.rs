//! crates/testlog/src/tracing_bridge.rs
//! Bridge between the tracing crate and test loggers.
//!
//! [`TestLayer`] is a `tracing-subscriber` layer that records every `tracing`
//! event on the [`TestLogger`](crate::TestLogger) named after the event target.
//! Code under test keeps using the standard macros while tests assert on the
//! captured [`LoggingEvent`](crate::LoggingEvent)s.
//!
//! # Field mapping
//!
//! - `message` becomes the message template.
//! - A field recorded as an error (`error = &err as &dyn Error`) becomes the
//!   captured error.
//! - A field named `marker` becomes the [`Marker`].
//! - Every other field becomes a `name=value` argument, in declaration order.
//!
//! Events with a `testlog` target are the crate's own diagnostics and are not
//! recorded.
//!
//! # Usage
//!
//! ```
//! use testlog::{LoggingEvent, TestLayer, TestLoggerFactory};
//! use tracing_subscriber::layer::SubscriberExt;
//!
//! let factory = TestLoggerFactory::new(None);
//! let subscriber = tracing_subscriber::registry().with(TestLayer::with_factory(factory.clone()));
//!
//! tracing::subscriber::with_default(subscriber, || {
//!     tracing::warn!(target: "billing", "card declined");
//! });
//!
//! assert_eq!(
//!     factory.get_logger("billing").logging_events(),
//!     [LoggingEvent::warn("card declined")]
//! );
//! ```

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use tracing::Subscriber;
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::TryInitError;

use crate::factory::TestLoggerFactory;
use crate::level::Level;
use crate::logger::LogCall;
use crate::marker::{CapturedError, Marker};

const MESSAGE_FIELD: &str = "message";
const MARKER_FIELD: &str = "marker";
const OWN_TARGET: &str = "testlog";

/// A tracing layer that records events on test loggers.
#[derive(Clone, Debug, Default)]
pub struct TestLayer {
    // `None` means the process-wide registry, resolved per event.
    factory: Option<Arc<TestLoggerFactory>>,
}

impl TestLayer {
    /// Creates a layer that records into the process-wide registry.
    #[must_use]
    pub const fn new() -> Self {
        Self { factory: None }
    }

    /// Creates a layer that records into `factory`.
    #[must_use]
    pub const fn with_factory(factory: Arc<TestLoggerFactory>) -> Self {
        Self {
            factory: Some(factory),
        }
    }

    fn is_own_target(target: &str) -> bool {
        target
            .strip_prefix(OWN_TARGET)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
    }

    fn factory(&self) -> Arc<TestLoggerFactory> {
        self.factory
            .clone()
            .unwrap_or_else(TestLoggerFactory::instance)
    }
}

impl<S> Layer<S> for TestLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let target = metadata.target();
        if Self::is_own_target(target) {
            return;
        }

        let logger = self.factory().get_logger(target);
        let level = Level::from(*metadata.level());
        if !logger.is_enabled(level) {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);
        logger.log(visitor.into_call(level));
    }
}

/// Visitor collecting the parts of a log call from event fields.
#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    arguments: Vec<String>,
    marker: Option<Marker>,
    error: Option<CapturedError>,
}

impl EventVisitor {
    fn record_text(&mut self, field: &Field, value: String) {
        match field.name() {
            MESSAGE_FIELD => self.message = Some(value),
            MARKER_FIELD => self.marker = Some(Marker::new(value)),
            name => self.arguments.push(format!("{name}={value}")),
        }
    }

    fn into_call(self, level: Level) -> LogCall {
        LogCall {
            level,
            marker: self.marker,
            message: self.message.unwrap_or_default(),
            arguments: self.arguments,
            error: self.error,
        }
    }
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_text(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_text(field, value.to_owned());
    }

    fn record_error(&mut self, _field: &Field, value: &(dyn Error + 'static)) {
        self.error = Some(CapturedError::from_error(value));
    }
}

/// Installs a global subscriber that records into the process-wide registry.
///
/// # Panics
///
/// Panics if a global subscriber is already set.
pub fn init() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry().with(TestLayer::new()).init();
}

/// Installs a global subscriber that records into the process-wide registry,
/// unless one is already set.
///
/// # Errors
///
/// Returns [`TryInitError`] if a global subscriber is already set.
pub fn try_init() -> Result<(), TryInitError> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry().with(TestLayer::new()).try_init()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::LoggingEvent;
    use std::io;
    use tracing_subscriber::layer::SubscriberExt;

    fn capture(f: impl FnOnce()) -> Arc<TestLoggerFactory> {
        let factory = TestLoggerFactory::new(None);
        let subscriber =
            tracing_subscriber::registry().with(TestLayer::with_factory(Arc::clone(&factory)));
        tracing::subscriber::with_default(subscriber, f);
        factory
    }

    #[test]
    fn own_targets_are_recognised() {
        assert!(TestLayer::is_own_target("testlog"));
        assert!(TestLayer::is_own_target("testlog::factory"));
        assert!(!TestLayer::is_own_target("testlogger"));
        assert!(!TestLayer::is_own_target("app::testlog"));
    }

    #[test]
    fn events_land_on_target_logger() {
        let factory = capture(|| {
            tracing::info!(target: "app::orders", "order placed");
            tracing::error!(target: "app::billing", "charge failed");
        });

        assert_eq!(
            factory.get_logger("app::orders").logging_events(),
            [LoggingEvent::info("order placed")]
        );
        assert_eq!(
            factory.get_logger("app::billing").logging_events(),
            [LoggingEvent::error("charge failed")]
        );
    }

    #[test]
    fn fields_become_arguments() {
        let factory = capture(|| {
            tracing::debug!(target: "app", user = "bob", attempts = 3, "login {{}} {{}}");
        });

        let events = factory.get_logger("app").logging_events();
        assert_eq!(events[0].message(), "login {} {}");
        assert_eq!(events[0].arguments(), ["user=bob", "attempts=3"]);
        assert_eq!(events[0].formatted_message(), "login user=bob attempts=3");
    }

    #[test]
    fn marker_and_error_fields_are_extracted() {
        let failure = io::Error::other("socket closed");
        let factory = capture(|| {
            tracing::warn!(
                target: "app",
                marker = "NETWORK",
                error = &failure as &(dyn Error + 'static),
                "send failed"
            );
        });

        let events = factory.get_logger("app").logging_events();
        assert_eq!(
            events,
            [LoggingEvent::warn("send failed")
                .with_marker(Marker::new("NETWORK"))
                .with_error(&failure)]
        );
    }

    #[test]
    fn disabled_levels_are_not_recorded() {
        let factory = TestLoggerFactory::new(None);
        factory.get_logger("app").set_enabled_levels([Level::Error]);
        let subscriber =
            tracing_subscriber::registry().with(TestLayer::with_factory(Arc::clone(&factory)));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "app", "ignored");
            tracing::error!(target: "app", "kept");
        });

        assert_eq!(
            factory.get_logger("app").logging_events(),
            [LoggingEvent::error("kept")]
        );
    }

    #[test]
    fn own_diagnostics_are_skipped() {
        let factory = capture(|| {
            tracing::debug!(target: "testlog::factory", "internal");
        });
        assert!(factory.all_logging_events().is_empty());
        assert!(factory.all_loggers().is_empty());
    }
}
