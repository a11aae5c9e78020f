// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-test capture of standard output and standard error.
//!
//! Each test writes through an [`OutputSink`] pair owned by its
//! [`TestContext`](crate::suite::TestContext). When buffering is on the sinks collect bytes in
//! memory, and once the test body returns they become an [`OutputCapture`] that is handed to the
//! result callbacks. When buffering is off (debug mode) the sinks pass writes straight through to
//! the process streams and the capture is inactive.

use std::{
    borrow::Cow,
    io::{self, Write},
};

/// Where a test's writes to one stream go.
#[derive(Debug)]
pub enum OutputSink {
    /// Writes are collected in memory.
    Buffered(Vec<u8>),

    /// Writes go to the process's standard output.
    Stdout(io::Stdout),

    /// Writes go to the process's standard error.
    Stderr(io::Stderr),
}

impl OutputSink {
    pub(crate) fn buffered() -> Self {
        OutputSink::Buffered(Vec::new())
    }

    /// Returns the buffered bytes, or `None` if this sink passes output through.
    pub(crate) fn into_buffer(self) -> Option<Vec<u8>> {
        match self {
            OutputSink::Buffered(buf) => Some(buf),
            OutputSink::Stdout(_) | OutputSink::Stderr(_) => None,
        }
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputSink::Buffered(out) => out.write(buf),
            OutputSink::Stdout(out) => out.write(buf),
            OutputSink::Stderr(out) => out.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputSink::Buffered(_) => Ok(()),
            OutputSink::Stdout(out) => out.flush(),
            OutputSink::Stderr(out) => out.flush(),
        }
    }
}

/// Output captured while a single test ran.
///
/// An inactive capture reads as empty on both streams.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OutputCapture {
    state: CaptureState,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
enum CaptureState {
    #[default]
    Inactive,
    Buffered {
        stdout: Vec<u8>,
        stderr: Vec<u8>,
    },
}

impl OutputCapture {
    /// Returns a capture for a test whose output was not buffered.
    pub fn inactive() -> Self {
        Self {
            state: CaptureState::Inactive,
        }
    }

    /// Returns a capture holding the given buffered output.
    pub fn buffered(stdout: impl Into<Vec<u8>>, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            state: CaptureState::Buffered {
                stdout: stdout.into(),
                stderr: stderr.into(),
            },
        }
    }

    /// Returns true if output was being buffered.
    pub fn is_active(&self) -> bool {
        matches!(self.state, CaptureState::Buffered { .. })
    }

    /// Returns captured standard output, decoded lossily. Empty if the capture is inactive.
    pub fn stdout(&self) -> Cow<'_, str> {
        match &self.state {
            CaptureState::Inactive => Cow::Borrowed(""),
            CaptureState::Buffered { stdout, .. } => String::from_utf8_lossy(stdout),
        }
    }

    /// Returns captured standard error, decoded lossily. Empty if the capture is inactive.
    pub fn stderr(&self) -> Cow<'_, str> {
        match &self.state {
            CaptureState::Inactive => Cow::Borrowed(""),
            CaptureState::Buffered { stderr, .. } => String::from_utf8_lossy(stderr),
        }
    }

    pub(crate) fn from_sinks(stdout: OutputSink, stderr: OutputSink) -> Self {
        match (stdout.into_buffer(), stderr.into_buffer()) {
            (Some(stdout), Some(stderr)) => Self::buffered(stdout, stderr),
            _ => Self::inactive(),
        }
    }
}
