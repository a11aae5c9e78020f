// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The lifecycle callbacks an execution engine invokes while running tests.

use crate::{capture::OutputCapture, identity::TestIdentity, traceback::ErrorInfo};

/// Observer of a test run.
///
/// An engine calls [`on_run_start`](Self::on_run_start) once, then for every test
/// [`on_test_start`](Self::on_test_start), exactly one outcome callback and
/// [`on_test_stop`](Self::on_test_stop), and finally [`on_run_stop`](Self::on_run_stop).
///
/// Every callback defaults to a no-op, so implementations only override what they care about.
pub trait TestResult {
    /// Called once before any test runs.
    fn on_run_start(&mut self) {}

    /// Called before a test runs.
    fn on_test_start(&mut self, _test: &TestIdentity) {}

    /// Called when a test passed.
    fn on_test_success(&mut self, _test: &TestIdentity) {}

    /// Called when a test failed an assertion.
    fn on_test_failure(&mut self, _test: &TestIdentity, _err: &ErrorInfo, _output: &OutputCapture) {
    }

    /// Called when a test hit an unexpected error.
    fn on_test_error(&mut self, _test: &TestIdentity, _err: &ErrorInfo, _output: &OutputCapture) {}

    /// Called when a test was skipped.
    fn on_test_skip(&mut self, _test: &TestIdentity, _reason: &str) {}

    /// Called when a test expected to fail passed.
    fn on_test_unexpected_success(&mut self, _test: &TestIdentity) {}

    /// Called when a test expected to fail did fail.
    fn on_test_expected_failure(
        &mut self,
        _test: &TestIdentity,
        _err: &ErrorInfo,
        _output: &OutputCapture,
    ) {
    }

    /// Called after a test's outcome has been reported, with whatever it wrote.
    fn on_test_stop(&mut self, _test: &TestIdentity, _output: &OutputCapture) {}

    /// Called once after all tests ran.
    fn on_run_stop(&mut self) {}

    /// Returns true if the engine should stop scheduling further tests.
    fn should_stop(&self) -> bool {
        false
    }
}
