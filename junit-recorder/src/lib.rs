// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Records unit test outcomes and writes them out as a JUnit XML report.
//!
//! A [`SuiteRunner`] runs a [`TestSuite`] through a [`TestExecutor`], which reports every test's
//! start, outcome and captured output to a [`ResultRecorder`]. Once the run is over, the
//! recorder writes `junit.xml` into the configured output directory.
//!
//! Hosts with their own execution engine can drive a [`ResultRecorder`] directly through the
//! [`TestResult`] callbacks.

pub mod capture;
pub mod errors;
pub mod executor;
pub mod identity;
pub mod recorder;
pub mod reporter;
pub mod result;
pub mod runner;
pub mod suite;
pub mod time;
pub mod traceback;

pub use executor::TestExecutor;
pub use identity::TestIdentity;
pub use recorder::{RecorderOptions, ResultRecorder, RunState};
pub use result::TestResult;
pub use runner::{SuiteRunner, SuiteRunnerConfig};
pub use suite::{Test, TestContext, TestError, TestSuite};
