// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced while writing out test results.

use crate::recorder::RunState;
use camino::Utf8PathBuf;
use thiserror::Error;

/// An error that occurred while writing the JUnit report.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteReportError {
    /// The report was requested before the run was finalized.
    #[error("cannot write JUnit report: the test run is {state}, not finalized")]
    NotFinalized {
        /// The state the run was in.
        state: RunState,
    },

    /// An error occurred while operating on the file system.
    #[error("error operating on path {path}")]
    Fs {
        /// The path being operated on.
        path: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },

    /// An error occurred while producing JUnit XML.
    #[error("error writing JUnit output to {path}")]
    Junit {
        /// The output file.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: junit_report::SerializeError,
    },
}
