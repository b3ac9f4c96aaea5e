//! Test utilities for promissory.
//!
//! This module provides shared helpers for unit tests:
//! - Consistent tracing-based logging initialization
//! - Phase/section macros for readable test output
//! - Runtime constructors
//! - Settlement assertion macros
//!
//! # Example
//! ```ignore
//! use promissory::test_utils::{init_test_logging, test_runtime};
//! use promissory::Promise;
//!
//! init_test_logging();
//! let rt = test_runtime();
//! let p: Promise<i32, String> = rt.resolved(1);
//! promissory::assert_fulfilled!(rt, p, 1);
//! ```

use crate::runtime::{LocalRuntime, RejectionPolicy, RuntimeConfig};
use std::sync::Once;
use tracing_subscriber::fmt::format::FmtSpan;

static INIT_LOGGING: Once = Once::new();

/// Turn limit used by test runtimes; far above anything a unit test needs.
pub const TEST_MAX_TURNS: u64 = 10_000;

/// Initialize test logging with trace-level output.
///
/// Safe to call multiple times; only initializes once.
pub fn init_test_logging() {
    init_test_logging_with_level(tracing::Level::TRACE);
}

/// Initialize test logging with a custom level.
///
/// The first call wins; later calls are no-ops.
pub fn init_test_logging_with_level(level: tracing::Level) {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_test_writer()
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(false)
            .try_init();
    });
}

/// A runtime that panics on unhandled rejections, with a bounded turn count.
#[must_use]
pub fn test_runtime() -> LocalRuntime {
    LocalRuntime::new(RuntimeConfig::new().max_turns(TEST_MAX_TURNS))
}

/// A runtime that records unhandled rejections instead of panicking.
#[must_use]
pub fn recording_runtime() -> LocalRuntime {
    LocalRuntime::new(
        RuntimeConfig::new()
            .max_turns(TEST_MAX_TURNS)
            .rejection_policy(RejectionPolicy::Record),
    )
}

/// Log a test phase transition with a visual separator.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(phase = %$name, "========================================");
        tracing::info!(phase = %$name, "TEST PHASE: {}", $name);
        tracing::info!(phase = %$name, "========================================");
    };
}

/// Log a section within a test phase.
#[macro_export]
macro_rules! test_section {
    ($name:expr) => {
        tracing::debug!(section = %$name, "--- {} ---", $name);
    };
}

/// Log test completion with summary.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        tracing::info!(test = %$name, "test completed successfully: {}", $name);
    };
    ($name:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::info!(
            test = %$name,
            $($key = %$value,)*
            "test completed successfully: {}",
            $name
        );
    };
}

/// Run `$runtime` until `$promise` settles and assert it fulfilled with
/// `$expected`.
#[macro_export]
macro_rules! assert_fulfilled {
    ($runtime:expr, $promise:expr, $expected:expr) => {
        match $runtime.block_on(&$promise) {
            Ok(Ok(value)) => assert_eq!(value, $expected),
            other => unreachable!("expected fulfilment with {:?}, got {:?}", $expected, other),
        }
    };
}

/// Run `$runtime` until `$promise` settles and assert it rejected with
/// `$expected`.
#[macro_export]
macro_rules! assert_rejected {
    ($runtime:expr, $promise:expr, $expected:expr) => {
        match $runtime.block_on(&$promise) {
            Ok(Err(reason)) => assert_eq!(reason, $expected),
            other => unreachable!("expected rejection with {:?}, got {:?}", $expected, other),
        }
    };
}
