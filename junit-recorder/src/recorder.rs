// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Records test outcomes into a JUnit report.

use crate::{
    capture::OutputCapture,
    errors::WriteReportError,
    identity::TestIdentity,
    reporter::{Color, FailureFlavor, ProgressOutcome, ProgressReporter, RunSummary},
    result::TestResult,
    time::{Clock, StopwatchStart, SystemClock},
    traceback::{ErrorInfo, InternalFrames, format_error},
};
use camino::{Utf8Path, Utf8PathBuf};
use debug_ignore::DebugIgnore;
use junit_report::{NonSuccessKind, Report, TestCase, TestCaseStatus};
use std::{
    fmt,
    fs::{self, File},
    io::{self, BufWriter, Write},
    time::Duration,
};
use tracing::{debug, warn};

/// The report name used unless another one is configured.
pub const DEFAULT_REPORT_NAME: &str = "Django Project Tests";

/// The name of the report file written into the output directory.
pub const REPORT_FILE_NAME: &str = "junit.xml";

static SKIP_PREFIX: &str = "Test Skipped: ";
static UNEXPECTED_SUCCESS_MESSAGE: &str = "Test Skipped: Unexpected Success";

/// Options for a [`ResultRecorder`].
#[derive(Clone, Debug)]
pub struct RecorderOptions {
    /// The name written to the root `<testsuite>` element.
    pub report_name: String,

    /// Whether test output is buffered, and so should be stored in the report.
    pub buffer: bool,

    /// Console verbosity: 0 is quiet, 1 prints a character per test, 2 a line per test.
    pub verbosity: u8,

    /// Whether to request a stop after the first failure, error or unexpected success.
    pub fail_fast: bool,

    /// Whether to colorize console output.
    pub color: Color,

    /// Which stack frames to elide from traces.
    pub internal_frames: InternalFrames,
}

impl Default for RecorderOptions {
    fn default() -> Self {
        Self {
            report_name: DEFAULT_REPORT_NAME.to_owned(),
            buffer: true,
            verbosity: 1,
            fail_fast: false,
            color: Color::default(),
            internal_frames: InternalFrames::default(),
        }
    }
}

/// The state of a test run, as seen by the recorder.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RunState {
    /// The run has not started.
    Idle,

    /// The run has started and tests are being recorded.
    Running,

    /// The run is over and the report is ready to be written.
    Finalized,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => write!(f, "idle"),
            RunState::Running => write!(f, "running"),
            RunState::Finalized => write!(f, "finalized"),
        }
    }
}

#[derive(Clone, Debug)]
struct FailureDetail {
    flavor: FailureFlavor,
    test: TestIdentity,
    trace: String,
}

/// Observes a test run and builds a JUnit [`Report`] from it.
///
/// The recorder implements [`TestResult`]. Once [`on_run_stop`](TestResult::on_run_stop) has been
/// called, [`serialize`](Self::serialize) writes the report out.
#[derive(Debug)]
pub struct ResultRecorder {
    options: RecorderOptions,
    progress: ProgressReporter,
    stream: DebugIgnore<Box<dyn Write>>,
    clock: Box<dyn Clock>,
    state: RunState,
    report: Report,
    run_start: Option<StopwatchStart>,
    case_start: StopwatchStart,
    // Index into the report of the case recorded for the current test.
    current_case: Option<usize>,
    tests_run: usize,
    skipped: usize,
    expected_failures: usize,
    unexpected_successes: usize,
    details: Vec<FailureDetail>,
    should_stop: bool,
}

impl ResultRecorder {
    /// Creates a new recorder that writes progress to standard error.
    pub fn new(options: RecorderOptions) -> Self {
        let clock: Box<dyn Clock> = Box::new(SystemClock);
        let case_start = StopwatchStart::new(&*clock);
        Self {
            progress: ProgressReporter::new(
                options.verbosity,
                options.color.should_colorize(supports_color::Stream::Stderr),
            ),
            report: Report::new(options.report_name.as_str()),
            options,
            stream: DebugIgnore(Box::new(io::stderr())),
            clock,
            state: RunState::Idle,
            run_start: None,
            case_start,
            current_case: None,
            tests_run: 0,
            skipped: 0,
            expected_failures: 0,
            unexpected_successes: 0,
            details: Vec::new(),
            should_stop: false,
        }
    }

    /// Writes progress to `stream` instead of standard error.
    ///
    /// There is no way to tell whether an arbitrary stream is a terminal, so with
    /// [`Color::Auto`] its output is not colorized.
    pub fn with_stream(mut self, stream: impl Write + 'static) -> Self {
        self.stream = DebugIgnore(Box::new(stream));
        self.progress = ProgressReporter::new(
            self.options.verbosity,
            matches!(self.options.color, Color::Always),
        );
        self
    }

    /// Measures time with `clock` instead of the system clock.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self.case_start = StopwatchStart::new(&*self.clock);
        self
    }

    /// Returns the options this recorder was created with.
    pub fn options(&self) -> &RecorderOptions {
        &self.options
    }

    /// Returns the current state of the run.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Returns the report built so far.
    pub fn report(&self) -> &Report {
        &self.report
    }

    /// Returns the number of tests started.
    pub fn tests_run(&self) -> usize {
        self.tests_run
    }

    /// Returns true if no test failed, errored or unexpectedly passed.
    pub fn was_successful(&self) -> bool {
        self.summary().is_success()
    }

    /// Returns the numbers shown in the closing summary.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            tests_run: self.tests_run,
            elapsed: self.report.time.unwrap_or(Duration::ZERO),
            failures: self.report.failures,
            errors: self.report.errors,
            skipped: self.skipped,
            expected_failures: self.expected_failures,
            unexpected_successes: self.unexpected_successes,
        }
    }

    /// Writes the details of every recorded failure and error to the progress stream.
    pub fn print_errors(&mut self) {
        let details = std::mem::take(&mut self.details);
        self.write_progress(|progress, writer| {
            progress.write_failure_details(
                details
                    .iter()
                    .map(|detail| (detail.flavor, &detail.test, detail.trace.as_str())),
                writer,
            )
        });
        self.details = details;
    }

    /// Writes the closing summary to the progress stream.
    pub fn print_summary(&mut self) {
        let summary = self.summary();
        self.write_progress(|progress, writer| progress.write_summary(&summary, writer));
    }

    /// Writes the report as `junit.xml` inside `output_dir`, creating the directory if needed.
    ///
    /// Any existing report file is overwritten. Returns the path to the file.
    pub fn serialize(&self, output_dir: &Utf8Path) -> Result<Utf8PathBuf, WriteReportError> {
        if self.state != RunState::Finalized {
            return Err(WriteReportError::NotFinalized { state: self.state });
        }

        fs::create_dir_all(output_dir).map_err(|error| WriteReportError::Fs {
            path: output_dir.to_owned(),
            error,
        })?;

        let path = output_dir.join(REPORT_FILE_NAME);
        let file = File::create(&path).map_err(|error| WriteReportError::Fs {
            path: path.clone(),
            error,
        })?;
        let mut writer = BufWriter::new(file);
        self.report
            .serialize(&mut writer)
            .map_err(|error| WriteReportError::Junit {
                path: path.clone(),
                error,
            })?;
        writer.flush().map_err(|error| WriteReportError::Fs {
            path: path.clone(),
            error,
        })?;

        debug!(%path, tests = self.report.tests, "wrote JUnit report");
        Ok(path)
    }

    // ---
    // Helper methods
    // ---

    fn add_case(&mut self, test: &TestIdentity, status: TestCaseStatus) {
        let mut test_case = TestCase::new(test.name(), test.classname(), status);
        test_case.set_time(self.case_start.elapsed(&*self.clock));
        self.report.add_test_case(test_case);
        self.current_case = Some(self.report.test_cases.len() - 1);
    }

    fn add_failed_case(
        &mut self,
        test: &TestIdentity,
        err: &ErrorInfo,
        output: &OutputCapture,
        kind: NonSuccessKind,
    ) {
        let trace = self.format_trace(err, output);
        let mut status = TestCaseStatus::non_success(kind);
        status
            .set_type(&err.exception_type)
            .set_message(&err.message)
            .set_description(&trace);
        self.add_case(test, status);

        let flavor = match kind {
            NonSuccessKind::Failure => FailureFlavor::Fail,
            NonSuccessKind::Error => FailureFlavor::Error,
        };
        self.details.push(FailureDetail {
            flavor,
            test: test.clone(),
            trace,
        });
        if self.options.fail_fast {
            self.should_stop = true;
        }
    }

    fn format_trace(&self, err: &ErrorInfo, output: &OutputCapture) -> String {
        let output = self.options.buffer.then_some(output);
        format_error(err, &self.options.internal_frames, output)
    }

    fn write_progress(
        &mut self,
        f: impl FnOnce(&ProgressReporter, &mut dyn Write) -> io::Result<()>,
    ) {
        if let Err(error) = f(&self.progress, &mut **self.stream) {
            warn!("failed to write test progress: {error}");
        }
    }
}

impl TestResult for ResultRecorder {
    fn on_run_start(&mut self) {
        if self.state != RunState::Idle {
            debug!(state = %self.state, "restarting test run, discarding previous results");
        }
        self.report = Report::new(self.options.report_name.as_str());
        self.run_start = Some(StopwatchStart::new(&*self.clock));
        self.case_start = StopwatchStart::new(&*self.clock);
        self.current_case = None;
        self.tests_run = 0;
        self.skipped = 0;
        self.expected_failures = 0;
        self.unexpected_successes = 0;
        self.details.clear();
        self.should_stop = false;
        self.state = RunState::Running;
        debug!(report_name = %self.options.report_name, "test run started");
    }

    fn on_test_start(&mut self, test: &TestIdentity) {
        self.case_start = StopwatchStart::new(&*self.clock);
        self.current_case = None;
        self.tests_run += 1;
        self.write_progress(|progress, writer| progress.write_test_start(test, writer));
    }

    fn on_test_success(&mut self, test: &TestIdentity) {
        self.add_case(test, TestCaseStatus::success());
        self.write_progress(|progress, writer| {
            progress.write_outcome(ProgressOutcome::Success, writer)
        });
    }

    fn on_test_failure(&mut self, test: &TestIdentity, err: &ErrorInfo, output: &OutputCapture) {
        self.add_failed_case(test, err, output, NonSuccessKind::Failure);
        self.write_progress(|progress, writer| {
            progress.write_outcome(ProgressOutcome::Failure, writer)
        });
    }

    fn on_test_error(&mut self, test: &TestIdentity, err: &ErrorInfo, output: &OutputCapture) {
        self.add_failed_case(test, err, output, NonSuccessKind::Error);
        self.write_progress(|progress, writer| {
            progress.write_outcome(ProgressOutcome::Error, writer)
        });
    }

    fn on_test_skip(&mut self, test: &TestIdentity, reason: &str) {
        let mut status = TestCaseStatus::skipped();
        status.set_message(format!("{SKIP_PREFIX}{reason}"));
        self.add_case(test, status);
        self.skipped += 1;
        self.write_progress(|progress, writer| {
            progress.write_outcome(ProgressOutcome::Skip(reason), writer)
        });
    }

    fn on_test_unexpected_success(&mut self, test: &TestIdentity) {
        let mut status = TestCaseStatus::skipped();
        status.set_message(UNEXPECTED_SUCCESS_MESSAGE);
        self.add_case(test, status);
        self.unexpected_successes += 1;
        if self.options.fail_fast {
            self.should_stop = true;
        }
        self.write_progress(|progress, writer| {
            progress.write_outcome(ProgressOutcome::UnexpectedSuccess, writer)
        });
    }

    fn on_test_expected_failure(
        &mut self,
        test: &TestIdentity,
        err: &ErrorInfo,
        output: &OutputCapture,
    ) {
        // Reported as a skip, not a failure, but with the full trace attached.
        let trace = self.format_trace(err, output);
        let mut status = TestCaseStatus::skipped();
        status
            .set_type(&err.exception_type)
            .set_message(&err.message)
            .set_description(trace);
        self.add_case(test, status);
        self.expected_failures += 1;
        self.write_progress(|progress, writer| {
            progress.write_outcome(ProgressOutcome::ExpectedFailure, writer)
        });
    }

    fn on_test_stop(&mut self, test: &TestIdentity, output: &OutputCapture) {
        // Outcomes reported outside a test, such as fixture errors, are timed from here.
        self.case_start = StopwatchStart::new(&*self.clock);
        let current_case = self.current_case.take();
        if !self.options.buffer {
            return;
        }
        let Some(index) = current_case else {
            debug!(%test, "no outcome was recorded for test, dropping its output");
            return;
        };

        let test_case = &mut self.report.test_cases[index];
        let stdout = output.stdout();
        if !stdout.is_empty() {
            test_case.set_system_out(stdout);
        }
        let stderr = output.stderr();
        if !stderr.is_empty() {
            test_case.set_system_err(stderr);
        }
    }

    fn on_run_stop(&mut self) {
        if self.state != RunState::Running {
            warn!(state = %self.state, "test run stopped without having started");
        }
        let elapsed = self
            .run_start
            .map(|start| start.elapsed(&*self.clock))
            .unwrap_or(Duration::ZERO);
        self.report.set_time(elapsed);
        // Suite fixture failures add cases but are not tests.
        self.report.tests = self.tests_run;
        self.state = RunState::Finalized;
        debug!(
            tests = self.report.tests,
            failures = self.report.failures,
            errors = self.report.errors,
            skips = self.report.skips,
            "test run finished in {:.3}s",
            elapsed.as_secs_f64(),
        );
    }

    fn should_stop(&self) -> bool {
        self.should_stop
    }
}
