//! Integration tests for the streaming log output
//!
//! These tests verify that strategy selection and failures reach a custom
//! logger. No GPU required.
//!
//! Run with: cargo test --test logging_integration_tests

use galaxy_3d_streaming::galaxy3d::device::DeviceCapabilities;
use galaxy_3d_streaming::galaxy3d::log::{self, LogEntry, LogSeverity, Logger};
use galaxy_3d_streaming::galaxy3d::StrategySelector;
use serial_test::serial;
use std::sync::{Arc, Mutex};

// ============================================================================
// TEST LOGGER IMPLEMENTATION
// ============================================================================

/// Test logger that captures log entries for verification
struct TestLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLogger {
    fn new() -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (Self { entries: entries.clone() }, entries)
    }
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

// ============================================================================
// LOGGING TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_custom_logger() {
    let (test_logger, entries) = TestLogger::new();
    log::set_logger(test_logger);

    log::log(LogSeverity::Info, "test::module", "Test info message".to_string());
    log::log(LogSeverity::Warn, "test::module", "Test warning message".to_string());

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 2);
    assert_eq!(captured[0].severity, LogSeverity::Info);
    assert_eq!(captured[0].source, "test::module");
    assert_eq!(captured[1].message, "Test warning message");
    assert!(captured[1].file.is_none());
    drop(captured);

    log::reset_logger();
}

#[test]
#[serial]
fn test_integration_detailed_log_carries_location() {
    let (test_logger, entries) = TestLogger::new();
    log::set_logger(test_logger);

    log::log_detailed(LogSeverity::Error, "test::module", "boom".to_string(), "device.rs", 12);

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].file, Some("device.rs"));
    assert_eq!(captured[0].line, Some(12));
    drop(captured);

    log::reset_logger();
}

#[test]
#[serial]
fn test_integration_unsupported_device_is_logged() {
    let (test_logger, entries) = TestLogger::new();
    log::set_logger(test_logger);

    let result = StrategySelector::select_kind(&DeviceCapabilities::new(1, 0));
    assert!(result.is_err());

    let captured = entries.lock().unwrap();
    let error = captured
        .iter()
        .find(|e| e.severity == LogSeverity::Error)
        .expect("selection failure should be logged");
    assert_eq!(error.source, "galaxy3d::StrategySelector");
    assert!(error.message.starts_with("Unsupported device"));
    drop(captured);

    log::reset_logger();
}
