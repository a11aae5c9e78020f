// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Console progress output for a test run.
//!
//! The output follows the conventions of xUnit-style text runners: one character per test at
//! verbosity 1, one line per test at verbosity 2, then the details of every failure and error and
//! a closing summary.

use crate::identity::TestIdentity;
use owo_colors::{OwoColorize, Style};
use std::{
    io::{self, Write},
    time::Duration,
};

static SEPARATOR_HEAVY: &str =
    "======================================================================";
static SEPARATOR_LIGHT: &str =
    "----------------------------------------------------------------------";

/// Specifies whether to colorize output.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Color {
    /// Colorize if the stream supports it.
    #[default]
    Auto,

    /// Always colorize.
    Always,

    /// Never colorize.
    Never,
}

impl Color {
    /// Determines whether output should be colorized based on whether the given stream supports
    /// this.
    pub fn should_colorize(self, stream: supports_color::Stream) -> bool {
        match self {
            Color::Auto => supports_color::on_cached(stream).is_some(),
            Color::Always => true,
            Color::Never => false,
        }
    }
}

#[derive(Debug, Default, Clone)]
struct Styles {
    count: Style,
    pass: Style,
    fail: Style,
    skip: Style,
}

impl Styles {
    fn colorize(&mut self) {
        self.count = Style::new().bold();
        self.pass = Style::new().green().bold();
        self.fail = Style::new().red().bold();
        self.skip = Style::new().yellow().bold();
    }
}

/// The outcome of a single test, as shown in progress output.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressOutcome<'a> {
    /// The test passed.
    Success,
    /// The test failed an assertion.
    Failure,
    /// The test hit an unexpected error.
    Error,
    /// The test was skipped for the given reason.
    Skip(&'a str),
    /// The test was expected to fail and did.
    ExpectedFailure,
    /// The test was expected to fail but passed.
    UnexpectedSuccess,
}

/// Whether an entry in the failure details is a failure or an error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailureFlavor {
    /// An assertion failure.
    Fail,
    /// An unexpected error.
    Error,
}

impl FailureFlavor {
    fn as_str(self) -> &'static str {
        match self {
            FailureFlavor::Fail => "FAIL",
            FailureFlavor::Error => "ERROR",
        }
    }
}

/// Aggregate numbers for the closing summary.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RunSummary {
    /// Number of tests that ran.
    pub tests_run: usize,
    /// Wall-clock time of the run.
    pub elapsed: Duration,
    /// Number of assertion failures.
    pub failures: usize,
    /// Number of unexpected errors.
    pub errors: usize,
    /// Number of skipped tests.
    pub skipped: usize,
    /// Number of tests that failed as expected.
    pub expected_failures: usize,
    /// Number of tests that passed despite being expected to fail.
    pub unexpected_successes: usize,
}

impl RunSummary {
    /// Returns true if nothing failed, errored or unexpectedly passed.
    pub fn is_success(&self) -> bool {
        self.failures == 0 && self.errors == 0 && self.unexpected_successes == 0
    }
}

/// Writes progress output at a given verbosity.
#[derive(Clone, Debug)]
pub struct ProgressReporter {
    verbosity: u8,
    styles: Styles,
}

impl ProgressReporter {
    /// Creates a new reporter. Verbosity 0 shows only failure details and the summary.
    ///
    /// `colorize` is usually the result of [`Color::should_colorize`] for the stream the reporter
    /// will write to.
    pub fn new(verbosity: u8, colorize: bool) -> Self {
        let mut styles = Styles::default();
        if colorize {
            styles.colorize();
        }
        Self { verbosity, styles }
    }

    /// Returns the verbosity.
    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    /// Writes the prefix shown while a test runs.
    pub fn write_test_start(&self, test: &TestIdentity, writer: &mut dyn Write) -> io::Result<()> {
        if self.verbosity >= 2 {
            write!(writer, "{test} ... ")?;
            writer.flush()?;
        }
        Ok(())
    }

    /// Writes the outcome of a test.
    pub fn write_outcome(
        &self,
        outcome: ProgressOutcome<'_>,
        writer: &mut dyn Write,
    ) -> io::Result<()> {
        match self.verbosity {
            0 => return Ok(()),
            1 => {
                let (mark, style) = match outcome {
                    ProgressOutcome::Success => (".", self.styles.pass),
                    ProgressOutcome::Failure => ("F", self.styles.fail),
                    ProgressOutcome::Error => ("E", self.styles.fail),
                    ProgressOutcome::Skip(_) => ("s", self.styles.skip),
                    ProgressOutcome::ExpectedFailure => ("x", self.styles.skip),
                    ProgressOutcome::UnexpectedSuccess => ("u", self.styles.fail),
                };
                write!(writer, "{}", mark.style(style))?;
            }
            _ => match outcome {
                ProgressOutcome::Success => writeln!(writer, "{}", "ok".style(self.styles.pass))?,
                ProgressOutcome::Failure => writeln!(writer, "{}", "FAIL".style(self.styles.fail))?,
                ProgressOutcome::Error => writeln!(writer, "{}", "ERROR".style(self.styles.fail))?,
                ProgressOutcome::Skip(reason) => writeln!(
                    writer,
                    "{} '{reason}'",
                    "skipped".style(self.styles.skip)
                )?,
                ProgressOutcome::ExpectedFailure => {
                    writeln!(writer, "{}", "expected failure".style(self.styles.skip))?
                }
                ProgressOutcome::UnexpectedSuccess => {
                    writeln!(writer, "{}", "unexpected success".style(self.styles.fail))?
                }
            },
        }
        writer.flush()
    }

    /// Writes the details of every failure and error.
    ///
    /// At verbosity 1 this first terminates the line of progress characters.
    pub fn write_failure_details<'a>(
        &self,
        details: impl IntoIterator<Item = (FailureFlavor, &'a TestIdentity, &'a str)>,
        writer: &mut dyn Write,
    ) -> io::Result<()> {
        if self.verbosity == 1 {
            writeln!(writer)?;
        }
        for (flavor, test, trace) in details {
            writeln!(writer, "{SEPARATOR_HEAVY}")?;
            writeln!(writer, "{}: {test}", flavor.as_str().style(self.styles.fail))?;
            writeln!(writer, "{SEPARATOR_LIGHT}")?;
            writeln!(writer, "{trace}")?;
        }
        writer.flush()
    }

    /// Writes the closing summary of a run.
    pub fn write_summary(&self, summary: &RunSummary, writer: &mut dyn Write) -> io::Result<()> {
        writeln!(writer, "{SEPARATOR_LIGHT}")?;
        writeln!(
            writer,
            "Ran {} test{} in {:.3}s",
            summary.tests_run.style(self.styles.count),
            if summary.tests_run == 1 { "" } else { "s" },
            summary.elapsed.as_secs_f64(),
        )?;
        writeln!(writer)?;

        let mut infos = Vec::new();
        if summary.is_success() {
            write!(writer, "{}", "OK".style(self.styles.pass))?;
        } else {
            write!(writer, "{}", "FAILED".style(self.styles.fail))?;
            if summary.failures > 0 {
                infos.push(format!("failures={}", summary.failures));
            }
            if summary.errors > 0 {
                infos.push(format!("errors={}", summary.errors));
            }
        }
        if summary.skipped > 0 {
            infos.push(format!("skipped={}", summary.skipped));
        }
        if summary.expected_failures > 0 {
            infos.push(format!("expected failures={}", summary.expected_failures));
        }
        if summary.unexpected_successes > 0 {
            infos.push(format!(
                "unexpected successes={}",
                summary.unexpected_successes
            ));
        }

        if infos.is_empty() {
            writeln!(writer)?;
        } else {
            writeln!(writer, " ({})", infos.join(", "))?;
        }
        writer.flush()
    }
}
