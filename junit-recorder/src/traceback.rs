// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error details for failed tests, and rendering them as stack traces.
//!
//! Frames are stored outermost-first (in call order). Rendering reverses them so that the output
//! reads like a Rust backtrace, innermost frame first.

use crate::capture::OutputCapture;
use regex::Regex;
use std::{
    any,
    backtrace::{Backtrace, BacktraceStatus},
    error::Error,
    fmt::{self, Write as _},
    sync::LazyLock,
};

/// The type reported for panics and explicit assertion failures.
pub const ASSERTION_FAILURE_TYPE: &str = "std::panic";

/// Delimiter placed before captured standard output in a rendered trace.
pub const STDOUT_LINE: &str = "\nStdout:\n";

/// Delimiter placed before captured standard error in a rendered trace.
pub const STDERR_LINE: &str = "\nStderr:\n";

/// A single stack frame.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StackFrame {
    /// The demangled function name, or `<unknown>` if it could not be resolved.
    pub function: String,

    /// The source file, if known.
    pub file: Option<String>,

    /// The line number, if known.
    pub line: Option<u32>,

    /// The column number, if known.
    pub column: Option<u32>,
}

impl StackFrame {
    /// Creates a frame with no source location.
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            file: None,
            line: None,
            column: None,
        }
    }

    /// Sets the source location of this frame.
    pub fn with_location(mut self, file: impl Into<String>, line: u32, column: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self.column = Some(column);
        self
    }
}

/// Information about an error raised by a test: its type, message and stack.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ErrorInfo {
    /// The module-qualified type of the error, e.g. `std::io::error::Error`.
    pub exception_type: String,

    /// The error message.
    pub message: String,

    /// Messages of the errors that caused this one, outermost first.
    pub causes: Vec<String>,

    /// Stack frames, outermost first.
    pub frames: Vec<StackFrame>,

    /// Whether this is an assertion failure rather than an unexpected error.
    ///
    /// Assertion failures are recorded as failures, and their traces are cut short at the
    /// assertion machinery.
    pub is_assertion: bool,
}

impl ErrorInfo {
    /// Creates a new `ErrorInfo` for an unexpected error, with no frames.
    pub fn new(exception_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            exception_type: exception_type.into(),
            message: message.into(),
            causes: Vec::new(),
            frames: Vec::new(),
            is_assertion: false,
        }
    }

    /// Creates a new `ErrorInfo` for an assertion failure, with no frames.
    pub fn assertion(message: impl Into<String>) -> Self {
        Self {
            is_assertion: true,
            ..Self::new(ASSERTION_FAILURE_TYPE, message)
        }
    }

    /// Creates an `ErrorInfo` from a Rust error, capturing the current stack.
    ///
    /// Frames belonging to the capture itself are dropped.
    pub fn from_error<E: Error + 'static>(error: &E) -> Self {
        let mut causes = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }

        let internal = InternalFrames::default();
        let mut frames = frames_from_backtrace(&Backtrace::force_capture());
        // The capture machinery sits at the innermost end.
        while frames.last().is_some_and(|frame| internal.is_internal(frame)) {
            frames.pop();
        }

        Self {
            causes,
            frames,
            ..Self::new(any::type_name::<E>(), error.to_string())
        }
    }

    /// Sets the stack frames, outermost first.
    pub fn with_frames(mut self, frames: impl IntoIterator<Item = StackFrame>) -> Self {
        self.frames = frames.into_iter().collect();
        self
    }
}

/// Decides which stack frames belong to the test machinery rather than to the test.
///
/// A frame is internal if its function path, or the trait path in a `<T as Trait>::method`
/// frame, starts with one of the configured prefixes. Unresolved frames are always internal.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InternalFrames {
    prefixes: Vec<String>,
}

impl InternalFrames {
    /// Prefixes that are internal by default: the standard library, the panic runtime and this
    /// crate.
    pub const DEFAULT_PREFIXES: &'static [&'static str] = &[
        "std::",
        "core::",
        "alloc::",
        "__rust",
        "rust_begin_unwind",
        "rust_panic",
        concat!(env!("CARGO_CRATE_NAME"), "::"),
    ];

    /// Creates a predicate with exactly the given prefixes.
    pub fn new(prefixes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Adds another prefix to treat as internal.
    pub fn add_prefix(&mut self, prefix: impl Into<String>) -> &mut Self {
        self.prefixes.push(prefix.into());
        self
    }

    /// Returns true if `frame` is internal.
    pub fn is_internal(&self, frame: &StackFrame) -> bool {
        let function = frame.function.as_str();
        if function == "<unknown>" {
            return true;
        }
        let self_path = function.trim_start_matches('<');
        let trait_path = self_path.split_once(" as ").map(|(_, rest)| rest);
        [Some(self_path), trait_path]
            .into_iter()
            .flatten()
            .any(|path| self.has_internal_prefix(path))
    }

    /// Returns the frames of `error` worth showing.
    ///
    /// Leading internal frames are skipped. For assertion failures, the trace is also cut at the
    /// first internal frame after that, which removes the assertion machinery.
    pub fn relevant_frames<'a>(&self, error: &'a ErrorInfo) -> &'a [StackFrame] {
        let frames = error.frames.as_slice();
        let start = frames
            .iter()
            .position(|frame| !self.is_internal(frame))
            .unwrap_or(frames.len());
        let frames = &frames[start..];

        if error.is_assertion {
            let len = frames
                .iter()
                .position(|frame| self.is_internal(frame))
                .unwrap_or(frames.len());
            &frames[..len]
        } else {
            frames
        }
    }

    fn has_internal_prefix(&self, path: &str) -> bool {
        self.prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

impl Default for InternalFrames {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PREFIXES.iter().copied())
    }
}

/// Renders `error` as a stack trace.
///
/// If `output` is given and was buffered, non-empty standard output and standard error are
/// appended after [`STDOUT_LINE`] and [`STDERR_LINE`].
pub fn format_error(
    error: &ErrorInfo,
    internal: &InternalFrames,
    output: Option<&OutputCapture>,
) -> String {
    let mut out = String::new();
    // Writing to a String never fails.
    let _ = write_error(error, internal, &mut out);

    if let Some(output) = output.filter(|output| output.is_active()) {
        push_section(&mut out, STDOUT_LINE, &output.stdout());
        push_section(&mut out, STDERR_LINE, &output.stderr());
    }

    out
}

fn write_error(error: &ErrorInfo, internal: &InternalFrames, out: &mut String) -> fmt::Result {
    if error.message.is_empty() {
        writeln!(out, "{}", error.exception_type)?;
    } else {
        writeln!(out, "{}: {}", error.exception_type, error.message)?;
    }

    if !error.causes.is_empty() {
        writeln!(out, "Caused by:")?;
        for cause in &error.causes {
            writeln!(out, "  - {cause}")?;
        }
    }

    let frames = internal.relevant_frames(error);
    if frames.is_empty() {
        return Ok(());
    }

    writeln!(out, "stack backtrace:")?;
    for (index, frame) in frames.iter().rev().enumerate() {
        writeln!(out, "{index:4}: {}", frame.function)?;
        if let Some(file) = &frame.file {
            write!(out, "             at {file}")?;
            if let Some(line) = frame.line {
                write!(out, ":{line}")?;
                if let Some(column) = frame.column {
                    write!(out, ":{column}")?;
                }
            }
            writeln!(out)?;
        }
    }

    Ok(())
}

fn push_section(out: &mut String, delimiter: &str, text: &str) {
    if text.is_empty() {
        return;
    }
    out.push_str(delimiter);
    out.push_str(text);
    if !text.ends_with('\n') {
        out.push('\n');
    }
}

static FRAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+: (.+)$").expect("frame regex is valid"));
static INLINED_FRAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+(\S.*)$").expect("inlined frame regex is valid"));
static LOCATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+at (?<file>.+?)(?::(?<line>\d+))?(?::(?<column>\d+))?$")
        .expect("location regex is valid")
});

/// Converts a captured backtrace into frames, outermost first.
///
/// Returns no frames if the backtrace was not captured.
pub fn frames_from_backtrace(backtrace: &Backtrace) -> Vec<StackFrame> {
    if backtrace.status() != BacktraceStatus::Captured {
        return Vec::new();
    }
    let mut frames = parse_backtrace(&backtrace.to_string());
    frames.reverse();
    frames
}

/// Parses the `Display` output of a [`Backtrace`], returning frames innermost first.
pub(crate) fn parse_backtrace(text: &str) -> Vec<StackFrame> {
    let mut frames: Vec<StackFrame> = Vec::new();
    for line in text.lines() {
        if let Some(captures) = LOCATION_REGEX.captures(line) {
            if let Some(frame) = frames.last_mut() {
                frame.file = Some(captures["file"].to_owned());
                frame.line = captures
                    .name("line")
                    .and_then(|line| line.as_str().parse().ok());
                frame.column = captures
                    .name("column")
                    .and_then(|column| column.as_str().parse().ok());
            }
        } else if let Some(captures) = FRAME_REGEX.captures(line) {
            frames.push(StackFrame::new(&captures[1]));
        } else if let Some(captures) = INLINED_FRAME_REGEX.captures(line) {
            // Inlined functions are printed without an index.
            frames.push(StackFrame::new(&captures[1]));
        }
    }
    frames
}

/// Returns the frames called from the innermost frame whose function contains `marker`.
///
/// `frames` is outermost first. If no frame matches, all frames are returned.
pub(crate) fn frames_below(frames: Vec<StackFrame>, marker: &str) -> Vec<StackFrame> {
    match frames
        .iter()
        .rposition(|frame| frame.function.contains(marker))
    {
        Some(index) => frames.into_iter().skip(index + 1).collect(),
        None => frames,
    }
}
