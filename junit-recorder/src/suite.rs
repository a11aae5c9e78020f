// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test suites: named collections of test bodies, with optional fixtures.

use crate::{
    capture::{OutputCapture, OutputSink},
    identity::TestIdentity,
    traceback::ErrorInfo,
};
use debug_ignore::DebugIgnore;
use std::{error::Error, fmt};

/// The body of a test or fixture.
pub type TestFn = Box<dyn Fn(&mut TestContext) -> Result<(), TestError>>;

/// The error a test body returns when it does not pass.
///
/// Any [`Error`] converts into [`TestError::Error`] through `?`. This type does not implement
/// `Error` itself, so that the blanket conversion is allowed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TestError {
    /// An assertion did not hold.
    Fail(ErrorInfo),

    /// The test hit an unexpected error.
    Error(ErrorInfo),

    /// The test decided at runtime that it should be skipped, for the given reason.
    Skip(String),
}

impl TestError {
    /// Returns an assertion failure with the given message.
    pub fn fail(message: impl Into<String>) -> Self {
        TestError::Fail(ErrorInfo::assertion(message))
    }

    /// Returns a runtime skip with the given reason.
    pub fn skip(reason: impl Into<String>) -> Self {
        TestError::Skip(reason.into())
    }
}

impl<E: Error + 'static> From<E> for TestError {
    fn from(error: E) -> Self {
        TestError::Error(ErrorInfo::from_error(&error))
    }
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestError::Fail(info) | TestError::Error(info) => {
                write!(f, "{}: {}", info.exception_type, info.message)
            }
            TestError::Skip(reason) => write!(f, "skipped: {reason}"),
        }
    }
}

/// Returns an assertion failure from the enclosing test body unless `cond` holds.
///
/// ```ignore
/// check!(total == 3, "expected 3 items, found {total}");
/// ```
#[macro_export]
macro_rules! check {
    ($cond:expr $(,)?) => {
        if !$cond {
            return ::std::result::Result::Err($crate::TestError::fail(concat!(
                "check failed: ",
                stringify!($cond)
            )));
        }
    };
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return ::std::result::Result::Err($crate::TestError::fail(format!($($arg)+)));
        }
    };
}

/// What a test body writes to, in place of the process's standard streams.
#[derive(Debug)]
pub struct TestContext {
    stdout: OutputSink,
    stderr: OutputSink,
}

impl TestContext {
    /// Creates a context whose output is buffered if `buffer` is true, and passed through to the
    /// process streams otherwise.
    pub fn new(buffer: bool) -> Self {
        if buffer {
            Self {
                stdout: OutputSink::buffered(),
                stderr: OutputSink::buffered(),
            }
        } else {
            Self {
                stdout: OutputSink::Stdout(std::io::stdout()),
                stderr: OutputSink::Stderr(std::io::stderr()),
            }
        }
    }

    /// Returns the test's standard output.
    pub fn stdout(&mut self) -> &mut OutputSink {
        &mut self.stdout
    }

    /// Returns the test's standard error.
    pub fn stderr(&mut self) -> &mut OutputSink {
        &mut self.stderr
    }

    /// Consumes the context, returning what it captured.
    pub fn into_capture(self) -> OutputCapture {
        OutputCapture::from_sinks(self.stdout, self.stderr)
    }
}

/// A single test: an identity, a body and flags that change how its outcome is read.
#[derive(Debug)]
pub struct Test {
    identity: TestIdentity,
    body: DebugIgnore<TestFn>,
    skip_reason: Option<String>,
    expected_failure: bool,
}

impl Test {
    /// Creates a new test.
    pub fn new(
        identity: TestIdentity,
        body: impl Fn(&mut TestContext) -> Result<(), TestError> + 'static,
    ) -> Self {
        Self {
            identity,
            body: DebugIgnore(Box::new(body)),
            skip_reason: None,
            expected_failure: false,
        }
    }

    /// Marks the test as skipped: its body never runs.
    pub fn skip(mut self, reason: impl Into<String>) -> Self {
        self.skip_reason = Some(reason.into());
        self
    }

    /// Marks the test as expected to fail.
    pub fn expected_failure(mut self) -> Self {
        self.expected_failure = true;
        self
    }

    /// Returns the identity of this test.
    pub fn identity(&self) -> &TestIdentity {
        &self.identity
    }

    /// Returns the reason this test is skipped, if it is.
    pub fn skip_reason(&self) -> Option<&str> {
        self.skip_reason.as_deref()
    }

    /// Returns true if this test is expected to fail.
    pub fn is_expected_failure(&self) -> bool {
        self.expected_failure
    }

    pub(crate) fn body(&self) -> &TestFn {
        &self.body
    }
}

/// A named, ordered collection of tests.
#[derive(Debug)]
pub struct TestSuite {
    name: String,
    tests: Vec<Test>,
    before_all: Option<DebugIgnore<TestFn>>,
    after_all: Option<DebugIgnore<TestFn>>,
}

impl TestSuite {
    /// Creates an empty suite.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tests: Vec::new(),
            before_all: None,
            after_all: None,
        }
    }

    /// Adds a test to the end of the suite.
    pub fn add_test(&mut self, test: Test) -> &mut Self {
        self.tests.push(test);
        self
    }

    /// Adds several tests to the end of the suite.
    pub fn add_tests(&mut self, tests: impl IntoIterator<Item = Test>) -> &mut Self {
        self.tests.extend(tests);
        self
    }

    /// Sets a fixture that runs once before any test.
    ///
    /// If it does not pass, no test in the suite runs and an error is recorded instead.
    pub fn set_before_all(
        &mut self,
        fixture: impl Fn(&mut TestContext) -> Result<(), TestError> + 'static,
    ) -> &mut Self {
        self.before_all = Some(DebugIgnore(Box::new(fixture)));
        self
    }

    /// Sets a fixture that runs once after every test.
    pub fn set_after_all(
        &mut self,
        fixture: impl Fn(&mut TestContext) -> Result<(), TestError> + 'static,
    ) -> &mut Self {
        self.after_all = Some(DebugIgnore(Box::new(fixture)));
        self
    }

    /// Returns the suite's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the tests in the suite, in run order.
    pub fn tests(&self) -> &[Test] {
        &self.tests
    }

    /// Returns the number of tests in the suite.
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Returns true if the suite has no tests.
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    pub(crate) fn before_all(&self) -> Option<&TestFn> {
        self.before_all.as_deref()
    }

    pub(crate) fn after_all(&self) -> Option<&TestFn> {
        self.after_all.as_deref()
    }
}
