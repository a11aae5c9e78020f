// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Generate single-suite JUnit reports in Rust.
//!
//! The root element of a report is a `<testsuite>`, carrying aggregate `tests`, `errors`,
//! `failures` and `skips` counts, followed by one `<testcase>` per recorded test outcome.

mod errors;
mod report;
mod serialize;

pub use errors::*;
pub use report::*;
