#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # Overview
//!
//! `testlog` records log calls in memory so tests can assert on what the code
//! under test logged. Nothing is written to a sink; events are kept until a
//! test clears them.
//!
//! Code logs either through [`TestLogger`] directly or through the `tracing`
//! macros with a [`TestLayer`] installed, in which case each event lands on
//! the logger named after its target.
//!
//! # Design
//!
//! [`TestLoggerFactory`] owns one [`TestLogger`] per name. Every accepted call
//! becomes an immutable [`LoggingEvent`] that is appended to four lists: the
//! logger's list for the calling thread, the logger's global list, and the
//! factory's thread and global aggregates.
//!
//! Per-thread lists make `cargo test`'s parallel threads invisible to each
//! other: [`TestLogger::logging_events`] and [`TestLogger::clear`] only see
//! the calling thread. The `all_*` variants and [`TestLogger::clear_all`] span
//! every thread. The registry mirrors this with
//! [`TestLoggerFactory::clear_loggers`] and
//! [`TestLoggerFactory::clear_all_loggers`].
//!
//! # Invariants
//!
//! - Enabled levels are per thread and not hierarchical. Enabling `INFO` does
//!   not enable `WARN`; every level to record must be listed.
//! - An event's context is a snapshot of the calling thread's [`mdc`] map at
//!   record time.
//! - Event equality ignores the originating logger, so expectations are built
//!   with [`LoggingEvent::info`] and friends.
//!
//! # Configuration
//!
//! The process-wide factory reads `print.level` from `testlog.properties` (in
//! `$CARGO_MANIFEST_DIR` or the current directory), overridden by the
//! `TESTLOG_PRINT_LEVEL` environment variable. Events at or above that level
//! are echoed to stdout/stderr as they are recorded. The default is `OFF`.
//!
//! # Examples
//!
//! ```
//! use testlog::{Level, LoggingEvent, ThreadResetGuard};
//!
//! let _reset = ThreadResetGuard::new();
//! let logger = testlog::test_logger("payments");
//! logger.set_enabled_levels([Level::Warn, Level::Error]);
//!
//! logger.info("ignored");
//! logger.warn_with("retrying {} of {}", [1, 3]);
//!
//! assert_eq!(
//!     logger.logging_events(),
//!     [LoggingEvent::warn("retrying {} of {}").with_args([1, 3])]
//! );
//! assert_eq!(logger.logging_events()[0].formatted_message(), "retrying 1 of 3");
//! ```

mod config;
mod error;
mod event;
mod factory;
mod level;
mod logger;
mod marker;
pub mod mdc;
mod message;
mod reset;
mod thread_local;
#[cfg(feature = "tracing")]
mod tracing_bridge;

pub use config::{
    OverridableProperties, PRINT_LEVEL_KEY, PRINT_LEVEL_OFF, SOURCE_NAME, parse_properties,
};
pub use error::{ConfigError, ParseLevelError};
pub use event::LoggingEvent;
pub use factory::{
    TestLoggerFactory, all_logging_events, all_test_loggers, clear, clear_all, logging_events,
    print_level, reset, set_print_level, test_logger, test_logger_for,
};
pub use level::{Level, LevelSet, LevelSetIter};
pub use logger::{LogCall, TestLogger};
pub use marker::{CapturedError, Marker};
pub use mdc::MdcInheritance;
pub use message::format_message;
pub use reset::{ExclusiveResetGuard, ThreadResetGuard};
#[cfg(feature = "tracing")]
#[cfg_attr(docsrs, doc(cfg(feature = "tracing")))]
pub use tracing_bridge::{TestLayer, init, try_init};
