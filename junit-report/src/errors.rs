// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced while writing out a JUnit report.

use thiserror::Error;

/// An error that occurs while writing a [`Report`](crate::Report) as XML: either the underlying
/// writer failed, or the report could not be encoded.
///
/// Returned by [`Report::serialize`](crate::Report::serialize) and
/// [`Report::to_string`](crate::Report::to_string).
#[derive(Debug, Error)]
#[error("error serializing JUnit report")]
pub struct SerializeError {
    #[from]
    inner: quick_xml::Error,
}
