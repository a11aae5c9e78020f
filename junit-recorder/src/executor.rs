// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs test suites synchronously, reporting each outcome to a [`TestResult`].
//!
//! Test bodies run under [`catch_unwind`](panic::catch_unwind). A panic hook, installed once per
//! process, captures the message and backtrace of panics raised while a body runs on the current
//! thread. Panics anywhere else are passed on to the hook that was installed before.

use crate::{
    capture::OutputCapture,
    identity::TestIdentity,
    result::TestResult,
    suite::{Test, TestContext, TestError, TestFn, TestSuite},
    traceback::{ErrorInfo, StackFrame, frames_below, frames_from_backtrace},
};
use std::{
    any::Any,
    backtrace::Backtrace,
    cell::{Cell, RefCell},
    panic::{self, AssertUnwindSafe},
    sync::Once,
    thread,
};
use tracing::debug;

/// Name of the function test bodies are called from. Frames outside it are dropped from traces.
const TEST_BODY_MARKER: &str = "invoke_test_body";

thread_local! {
    static IN_TEST_BODY: Cell<bool> = const { Cell::new(false) };
    static CAUGHT_PANIC: RefCell<Option<CaughtPanic>> = const { RefCell::new(None) };
}

static INSTALL_HOOK: Once = Once::new();

#[derive(Debug)]
struct CaughtPanic {
    message: String,
    frames: Vec<StackFrame>,
}

/// Runs the tests in a [`TestSuite`] one after another on the current thread.
#[derive(Clone, Debug)]
pub struct TestExecutor {
    buffer: bool,
}

impl TestExecutor {
    /// Creates a new executor. If `buffer` is false, test output goes straight to the process
    /// streams and is not recorded.
    pub fn new(buffer: bool) -> Self {
        Self { buffer }
    }

    /// Returns true if test output is buffered.
    pub fn buffer(&self) -> bool {
        self.buffer
    }

    /// Runs every test in `suite`, bracketed by the run start and stop callbacks.
    ///
    /// Tests stop being started once [`TestResult::should_stop`] returns true.
    pub fn run_suite(&self, suite: &TestSuite, result: &mut dyn TestResult) {
        install_panic_hook();
        result.on_run_start();
        debug!(suite = suite.name(), tests = suite.len(), "running test suite");

        let set_up = match suite.before_all() {
            Some(fixture) => self.run_fixture(suite, "before_all", fixture, result),
            None => true,
        };
        if set_up {
            for test in suite.tests() {
                if result.should_stop() {
                    debug!(suite = suite.name(), "stop requested, not starting further tests");
                    break;
                }
                self.run_test(test, result);
            }
            if let Some(fixture) = suite.after_all() {
                self.run_fixture(suite, "after_all", fixture, result);
            }
        }

        result.on_run_stop();
    }

    /// Runs a single test, reporting its start, outcome and stop.
    pub fn run_test(&self, test: &Test, result: &mut dyn TestResult) {
        install_panic_hook();
        let identity = test.identity();
        result.on_test_start(identity);

        if let Some(reason) = test.skip_reason() {
            result.on_test_skip(identity, reason);
            result.on_test_stop(identity, &OutputCapture::inactive());
            return;
        }

        let mut ctx = TestContext::new(self.buffer);
        let outcome = run_body(test.body(), &mut ctx);
        let output = ctx.into_capture();

        match (outcome, test.is_expected_failure()) {
            (Outcome::Pass, false) => result.on_test_success(identity),
            (Outcome::Pass, true) => result.on_test_unexpected_success(identity),
            (Outcome::Fail(err) | Outcome::Error(err), true) => {
                result.on_test_expected_failure(identity, &err, &output)
            }
            (Outcome::Fail(err), false) => result.on_test_failure(identity, &err, &output),
            (Outcome::Error(err), false) => result.on_test_error(identity, &err, &output),
            (Outcome::Skip(reason), _) => result.on_test_skip(identity, &reason),
        }

        result.on_test_stop(identity, &output);
    }

    /// Runs a suite fixture. Returns true if it passed.
    ///
    /// Fixtures are not tests: a fixture that does not pass is reported as an error (or a skip)
    /// on a description-only identity, without a matching test start.
    fn run_fixture(
        &self,
        suite: &TestSuite,
        fixture_name: &str,
        fixture: &TestFn,
        result: &mut dyn TestResult,
    ) -> bool {
        let identity = TestIdentity::from_description(format!("{fixture_name} ({})", suite.name()))
            .with_class_name(suite.name());

        let mut ctx = TestContext::new(self.buffer);
        let outcome = run_body(fixture, &mut ctx);
        let output = ctx.into_capture();

        let passed = match outcome {
            Outcome::Pass => return true,
            Outcome::Fail(err) | Outcome::Error(err) => {
                debug!(%identity, "suite fixture failed: {}", err.message);
                result.on_test_error(&identity, &err, &output);
                false
            }
            Outcome::Skip(reason) => {
                debug!(%identity, "suite fixture requested a skip: {reason}");
                result.on_test_skip(&identity, &reason);
                false
            }
        };
        result.on_test_stop(&identity, &output);
        passed
    }
}

impl Default for TestExecutor {
    fn default() -> Self {
        Self::new(true)
    }
}

#[derive(Debug)]
enum Outcome {
    Pass,
    Fail(ErrorInfo),
    Error(ErrorInfo),
    Skip(String),
}

fn run_body(body: &TestFn, ctx: &mut TestContext) -> Outcome {
    match invoke_test_body(body, ctx) {
        Ok(Ok(())) => Outcome::Pass,
        Ok(Err(TestError::Fail(err))) => Outcome::Fail(trim_outer_frames(err)),
        Ok(Err(TestError::Error(err))) => Outcome::Error(trim_outer_frames(err)),
        Ok(Err(TestError::Skip(reason))) => Outcome::Skip(reason),
        Err(payload) => Outcome::Fail(take_caught_panic(payload.as_ref())),
    }
}

// Must stay a distinct frame: traces are cut at it.
#[inline(never)]
fn invoke_test_body(
    body: &TestFn,
    ctx: &mut TestContext,
) -> thread::Result<Result<(), TestError>> {
    CAUGHT_PANIC.with_borrow_mut(|caught| *caught = None);
    IN_TEST_BODY.set(true);
    let result = panic::catch_unwind(AssertUnwindSafe(|| body(ctx)));
    IN_TEST_BODY.set(false);
    result
}

fn trim_outer_frames(mut err: ErrorInfo) -> ErrorInfo {
    err.frames = frames_below(std::mem::take(&mut err.frames), TEST_BODY_MARKER);
    err
}

fn take_caught_panic(payload: &(dyn Any + Send)) -> ErrorInfo {
    match CAUGHT_PANIC.take() {
        Some(caught) => ErrorInfo::assertion(caught.message)
            .with_frames(frames_below(caught.frames, TEST_BODY_MARKER)),
        None => {
            // Another hook was installed over ours, so only the payload is available.
            ErrorInfo::assertion(payload_message(payload))
        }
    }
}

fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Box<dyn Any>".to_owned()
    }
}

fn install_panic_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !IN_TEST_BODY.get() {
                previous(info);
                return;
            }
            let message = info
                .payload_as_str()
                .map_or_else(|| "Box<dyn Any>".to_owned(), ToOwned::to_owned);
            let frames = frames_from_backtrace(&Backtrace::force_capture());
            CAUGHT_PANIC.set(Some(CaughtPanic { message, frames }));
        }));
        debug!("installed test panic hook");
    });
}
