// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs a suite end to end and writes the JUnit report.

use crate::{
    errors::WriteReportError,
    executor::TestExecutor,
    recorder::{DEFAULT_REPORT_NAME, RecorderOptions, ResultRecorder},
    reporter::Color,
    suite::TestSuite,
    time::Clock,
    traceback::InternalFrames,
};
use camino::{Utf8Path, Utf8PathBuf};
use debug_ignore::DebugIgnore;
use std::io::Write;
use tracing::debug;

/// The directory reports are written to unless another one is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "reports";

/// Configuration for a [`SuiteRunner`].
///
/// Values are supplied by the host; nothing here is read from the environment.
#[derive(Clone, Debug)]
pub struct SuiteRunnerConfig {
    output_dir: Utf8PathBuf,
    debug: bool,
    verbosity: u8,
    fail_fast: bool,
    color: Color,
    report_name: String,
    internal_frames: InternalFrames,
}

impl SuiteRunnerConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self {
            output_dir: Utf8PathBuf::from(DEFAULT_OUTPUT_DIR),
            debug: false,
            verbosity: 1,
            fail_fast: false,
            color: Color::default(),
            report_name: DEFAULT_REPORT_NAME.to_owned(),
            internal_frames: InternalFrames::default(),
        }
    }

    /// Sets the directory `junit.xml` is written to.
    pub fn set_output_dir(&mut self, output_dir: impl Into<Utf8PathBuf>) -> &mut Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Sets debug mode. In debug mode test output is not buffered, so it shows up as the tests
    /// run and is left out of the report.
    pub fn set_debug(&mut self, debug: bool) -> &mut Self {
        self.debug = debug;
        self
    }

    /// Sets the console verbosity.
    pub fn set_verbosity(&mut self, verbosity: u8) -> &mut Self {
        self.verbosity = verbosity;
        self
    }

    /// Sets whether to stop after the first failure, error or unexpected success.
    pub fn set_fail_fast(&mut self, fail_fast: bool) -> &mut Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Sets whether console output is colorized.
    pub fn set_color(&mut self, color: Color) -> &mut Self {
        self.color = color;
        self
    }

    /// Sets the name written to the report's `<testsuite>` element.
    pub fn set_report_name(&mut self, report_name: impl Into<String>) -> &mut Self {
        self.report_name = report_name.into();
        self
    }

    /// Sets which stack frames are elided from traces.
    pub fn set_internal_frames(&mut self, internal_frames: InternalFrames) -> &mut Self {
        self.internal_frames = internal_frames;
        self
    }

    /// Returns the output directory.
    pub fn output_dir(&self) -> &Utf8Path {
        &self.output_dir
    }

    /// Returns true if debug mode is on.
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Returns the console verbosity.
    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    /// Returns the options a recorder for this configuration is created with.
    pub fn recorder_options(&self) -> RecorderOptions {
        RecorderOptions {
            report_name: self.report_name.clone(),
            buffer: !self.debug,
            verbosity: self.verbosity,
            fail_fast: self.fail_fast,
            color: self.color,
            internal_frames: self.internal_frames.clone(),
        }
    }
}

impl Default for SuiteRunnerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs a [`TestSuite`], prints a summary and writes `junit.xml`.
#[derive(Debug)]
pub struct SuiteRunner {
    config: SuiteRunnerConfig,
    stream: Option<DebugIgnore<Box<dyn Fn() -> Box<dyn Write>>>>,
    clock: Option<DebugIgnore<Box<dyn Fn() -> Box<dyn Clock>>>>,
}

impl SuiteRunner {
    /// Creates a new runner.
    pub fn new(config: SuiteRunnerConfig) -> Self {
        Self {
            config,
            stream: None,
            clock: None,
        }
    }

    /// Writes console output to streams made by `make_stream` rather than standard error.
    ///
    /// `make_stream` is called once per run.
    pub fn with_stream<W: Write + 'static>(
        mut self,
        make_stream: impl Fn() -> W + 'static,
    ) -> Self {
        self.stream = Some(DebugIgnore(Box::new(move || -> Box<dyn Write> {
            Box::new(make_stream())
        })));
        self
    }

    /// Measures time with clocks made by `make_clock` rather than the system clock.
    ///
    /// `make_clock` is called once per run.
    pub fn with_clock<C: Clock + 'static>(
        mut self,
        make_clock: impl Fn() -> C + 'static,
    ) -> Self {
        self.clock = Some(DebugIgnore(Box::new(move || -> Box<dyn Clock> {
            Box::new(make_clock())
        })));
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SuiteRunnerConfig {
        &self.config
    }

    /// Runs `suite`, prints failure details and the summary, then writes the report.
    ///
    /// Returns the recorder, which holds the report and the outcome counts, once the report has
    /// been written. Test outcomes never cause an error: only writing the report can fail.
    pub fn run(&self, suite: &TestSuite) -> Result<ResultRecorder, WriteReportError> {
        let mut recorder = self.make_recorder();
        let executor = TestExecutor::new(!self.config.debug);
        debug!(
            suite = suite.name(),
            output_dir = %self.config.output_dir,
            debug = self.config.debug,
            "running test suite",
        );

        executor.run_suite(suite, &mut recorder);
        recorder.print_errors();
        recorder.print_summary();

        let path = recorder.serialize(&self.config.output_dir)?;
        debug!(%path, successful = recorder.was_successful(), "test suite finished");
        Ok(recorder)
    }

    fn make_recorder(&self) -> ResultRecorder {
        let mut recorder = ResultRecorder::new(self.config.recorder_options());
        if let Some(make_stream) = &self.stream {
            recorder = recorder.with_stream((make_stream.0)());
        }
        if let Some(make_clock) = &self.clock {
            recorder = recorder.with_clock((make_clock.0)());
        }
        recorder
    }
}
