//! Integration tests for the process-wide registry and its shortcuts.
//!
//! These tests share the process-wide factory, so each one holds an
//! [`ExclusiveResetGuard`] for its whole body.

use std::collections::HashSet;
use std::sync::Arc;

use test_support::run_concurrently;
use testlog::{ExclusiveResetGuard, Level, LoggingEvent, TestLoggerFactory};

struct CheckoutService;

// ============================================================================
// Logger Identity
// ============================================================================

/// Verifies the same name yields the same logger and different names differ.
#[test]
fn logger_identity_by_name() {
    let _guard = ExclusiveResetGuard::new();

    let first = testlog::test_logger("x");
    let again = testlog::test_logger("x");
    let other = testlog::test_logger("y");

    assert!(Arc::ptr_eq(&first, &again));
    assert!(!Arc::ptr_eq(&first, &other));
    assert_eq!(
        testlog::all_test_loggers().keys().cloned().collect::<HashSet<_>>(),
        HashSet::from(["x".to_owned(), "y".to_owned()])
    );
}

/// Verifies many threads racing on a new name all get one instance.
#[test]
fn concurrent_get_logger_yields_one_instance() {
    let _guard = ExclusiveResetGuard::new();

    let loggers = run_concurrently(16, |_| testlog::test_logger("contended"));
    assert!(loggers.iter().all(|logger| Arc::ptr_eq(logger, &loggers[0])));
    assert_eq!(testlog::all_test_loggers().len(), 1);
}

/// Verifies type-named loggers use the type path.
#[test]
fn type_named_logger_matches_type_name() {
    let _guard = ExclusiveResetGuard::new();

    let logger = testlog::test_logger_for::<CheckoutService>();
    assert_eq!(logger.name(), std::any::type_name::<CheckoutService>());
    assert!(Arc::ptr_eq(
        &logger,
        &TestLoggerFactory::instance().get_logger_for::<CheckoutService>()
    ));
}

// ============================================================================
// Aggregates and Resets
// ============================================================================

/// Verifies the registry views span loggers and the shortcuts clear them.
#[test]
fn shortcuts_operate_on_process_wide_registry() {
    let _guard = ExclusiveResetGuard::new();

    testlog::test_logger("a").info("from a");
    testlog::test_logger("b").error("from b");
    assert_eq!(
        testlog::logging_events(),
        [LoggingEvent::info("from a"), LoggingEvent::error("from b")]
    );

    testlog::clear();
    assert!(testlog::logging_events().is_empty());
    assert_eq!(testlog::all_logging_events().len(), 2);

    testlog::clear_all();
    assert!(testlog::all_logging_events().is_empty());
    assert_eq!(testlog::all_test_loggers().len(), 2);

    testlog::reset();
    assert!(testlog::all_test_loggers().is_empty());
}

/// Verifies the print level can be changed at runtime and restored.
#[test]
fn print_level_is_adjustable() {
    let _guard = ExclusiveResetGuard::new();

    let configured = testlog::print_level();
    testlog::set_print_level(Some(Level::Error));
    assert_eq!(testlog::print_level(), Some(Level::Error));
    testlog::test_logger("printed").error("echoed to stderr");
    testlog::set_print_level(configured);
    assert_eq!(testlog::print_level(), configured);
}

/// Verifies `try_instance` succeeds without a properties file.
#[test]
fn default_configuration_is_valid() {
    let _guard = ExclusiveResetGuard::new();

    let factory = TestLoggerFactory::try_instance().unwrap();
    assert!(Arc::ptr_eq(&factory, &TestLoggerFactory::instance()));
}
