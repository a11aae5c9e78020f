// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{SerializeError, serialize::serialize_report};
use std::{
    borrow::{Borrow, Cow},
    fmt, io,
    ops::Deref,
    time::Duration,
};

/// The root element of a JUnit report: a single `<testsuite>`.
#[derive(Clone, Debug)]
pub struct Report {
    /// The name of this report.
    pub name: XmlString,

    /// The total number of test cases in this report.
    pub tests: usize,

    /// The number of test cases that errored.
    ///
    /// An "error" is usually some sort of *unexpected* issue in a test.
    pub errors: usize,

    /// The number of test cases that failed.
    ///
    /// A "failure" is usually an assertion that did not hold.
    pub failures: usize,

    /// The number of test cases that were skipped.
    pub skips: usize,

    /// The overall time taken by the run.
    ///
    /// This is serialized as the number of seconds, with 3 decimal places.
    pub time: Option<Duration>,

    /// The test cases contained in this report, in the order they were recorded.
    pub test_cases: Vec<TestCase>,
}

impl Report {
    /// Creates a new, empty `Report` with the given name.
    pub fn new(name: impl Into<XmlString>) -> Self {
        Self {
            name: name.into(),
            tests: 0,
            errors: 0,
            failures: 0,
            skips: 0,
            time: None,
            test_cases: vec![],
        }
    }

    /// Sets the time taken for overall execution.
    pub fn set_time(&mut self, time: Duration) -> &mut Self {
        self.time = Some(time);
        self
    }

    /// Adds a new test case and updates the `tests`, `errors`, `failures` and `skips` counts.
    ///
    /// When generating a new report, use of this method is recommended over adding to
    /// `self.test_cases` directly.
    pub fn add_test_case(&mut self, test_case: TestCase) -> &mut Self {
        self.tests += 1;
        match &test_case.status {
            TestCaseStatus::Success => {}
            TestCaseStatus::NonSuccess { kind, .. } => match kind {
                NonSuccessKind::Failure => self.failures += 1,
                NonSuccessKind::Error => self.errors += 1,
            },
            TestCaseStatus::Skipped { .. } => self.skips += 1,
        }
        self.test_cases.push(test_case);
        self
    }

    /// Adds several test cases and updates the counts.
    pub fn add_test_cases(&mut self, test_cases: impl IntoIterator<Item = TestCase>) -> &mut Self {
        for test_case in test_cases {
            self.add_test_case(test_case);
        }
        self
    }

    /// Serialize this report to the given writer.
    pub fn serialize(&self, writer: impl io::Write) -> Result<(), SerializeError> {
        serialize_report(self, writer).map_err(SerializeError::from)
    }

    /// Serialize this report to a string.
    pub fn to_string(&self) -> Result<String, SerializeError> {
        let mut buf: Vec<u8> = vec![];
        self.serialize(&mut buf)?;
        String::from_utf8(buf).map_err(|utf8_err| {
            quick_xml::Error::NonDecodable(Some(utf8_err.utf8_error())).into()
        })
    }
}

/// Represents a single test case.
#[derive(Clone, Debug)]
pub struct TestCase {
    /// The name of the test case, typically the test function or method.
    pub name: XmlString,

    /// The "classname" of the test case.
    ///
    /// This is the dot-separated path to the group the test belongs to. `classname` + `name`
    /// together should uniquely identify and locate a test.
    pub classname: XmlString,

    /// The time it took to execute this test case.
    ///
    /// This is serialized as the number of seconds, with 6 decimal places.
    pub time: Option<Duration>,

    /// The status of this test.
    pub status: TestCaseStatus,

    /// Data written to standard output while the test case was executed.
    pub system_out: Option<XmlString>,

    /// Data written to standard error while the test case was executed.
    pub system_err: Option<XmlString>,
}

impl TestCase {
    /// Creates a new test case.
    pub fn new(
        name: impl Into<XmlString>,
        classname: impl Into<XmlString>,
        status: TestCaseStatus,
    ) -> Self {
        Self {
            name: name.into(),
            classname: classname.into(),
            time: None,
            status,
            system_out: None,
            system_err: None,
        }
    }

    /// Sets the time taken for the test case.
    pub fn set_time(&mut self, time: Duration) -> &mut Self {
        self.time = Some(time);
        self
    }

    /// Sets standard output.
    pub fn set_system_out(&mut self, system_out: impl Into<XmlString>) -> &mut Self {
        self.system_out = Some(system_out.into());
        self
    }

    /// Sets standard error.
    pub fn set_system_err(&mut self, system_err: impl Into<XmlString>) -> &mut Self {
        self.system_err = Some(system_err.into());
        self
    }
}

/// Represents the outcome of a test case.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TestCaseStatus {
    /// This test case passed.
    Success,

    /// This test case did not pass.
    NonSuccess {
        /// Whether this test case failed an assertion (failure) or hit an unexpected error.
        kind: NonSuccessKind,

        /// The "type" of failure that occurred, typically a module-qualified type name.
        ty: Option<XmlString>,

        /// The failure message.
        message: Option<XmlString>,

        /// The description of the failure, typically a formatted stack trace.
        ///
        /// This is serialized as the text node of the element.
        description: Option<XmlString>,
    },

    /// This test case was skipped, or its outcome is reported as a skip.
    Skipped {
        /// The "type" of skip that occurred.
        ty: Option<XmlString>,

        /// The skip message.
        message: Option<XmlString>,

        /// The description of the skip.
        ///
        /// This is serialized as the text node of the element.
        description: Option<XmlString>,
    },
}

impl TestCaseStatus {
    /// Creates a new `TestCaseStatus` that represents a successful test.
    pub fn success() -> Self {
        TestCaseStatus::Success
    }

    /// Creates a new `TestCaseStatus` that represents an unsuccessful test.
    pub fn non_success(kind: NonSuccessKind) -> Self {
        TestCaseStatus::NonSuccess {
            kind,
            ty: None,
            message: None,
            description: None,
        }
    }

    /// Creates a new `TestCaseStatus` that represents a skipped test.
    pub fn skipped() -> Self {
        TestCaseStatus::Skipped {
            ty: None,
            message: None,
            description: None,
        }
    }

    /// Sets the type. No-op if this is a success case.
    pub fn set_type(&mut self, ty: impl Into<XmlString>) -> &mut Self {
        let ty_mut = match self {
            TestCaseStatus::Success => return self,
            TestCaseStatus::NonSuccess { ty, .. } => ty,
            TestCaseStatus::Skipped { ty, .. } => ty,
        };
        *ty_mut = Some(ty.into());
        self
    }

    /// Sets the message. No-op if this is a success case.
    pub fn set_message(&mut self, message: impl Into<XmlString>) -> &mut Self {
        let message_mut = match self {
            TestCaseStatus::Success => return self,
            TestCaseStatus::NonSuccess { message, .. } => message,
            TestCaseStatus::Skipped { message, .. } => message,
        };
        *message_mut = Some(message.into());
        self
    }

    /// Sets the description (text node). No-op if this is a success case.
    pub fn set_description(&mut self, description: impl Into<XmlString>) -> &mut Self {
        let description_mut = match self {
            TestCaseStatus::Success => return self,
            TestCaseStatus::NonSuccess { description, .. } => description,
            TestCaseStatus::Skipped { description, .. } => description,
        };
        *description_mut = Some(description.into());
        self
    }

    /// Returns true if this status has a child element in the serialized report.
    pub fn has_payload(&self) -> bool {
        !matches!(self, TestCaseStatus::Success)
    }
}

/// The kind of a non-successful test case.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NonSuccessKind {
    /// An assertion did not hold. Serialized as `failure`.
    Failure,

    /// The test hit an unexpected error. Serialized as `error`.
    Error,
}

/// A string that can be embedded in an XML document.
///
/// ANSI escape sequences, and characters that XML 1.0 cannot represent (C0 controls, U+FFFE and
/// U+FFFF), are removed on construction. Tab, newline and carriage return are kept.
#[derive(Clone, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct XmlString {
    data: Box<str>,
}

impl XmlString {
    /// Creates a new `XmlString`, removing any ANSI escapes and non-printable characters from it.
    pub fn new(data: impl AsRef<str>) -> Self {
        let data = data.as_ref();
        let data = if data.contains('\x1b') {
            Cow::Owned(strip_ansi_escapes::strip_str(data))
        } else {
            Cow::Borrowed(data)
        };
        let data = data
            .replace(
                |c| {
                    matches!(
                        c,
                        '\x00'..='\x08'
                            | '\x0b'
                            | '\x0c'
                            | '\x0e'..='\x1f'
                            | '\u{fffe}'
                            | '\u{ffff}'
                    )
                },
                "",
            )
            .into_boxed_str();
        Self { data }
    }

    /// Returns the string.
    pub fn as_str(&self) -> &str {
        &self.data
    }

    /// Converts this into a `String`.
    pub fn into_string(self) -> String {
        self.data.into_string()
    }
}

impl From<&str> for XmlString {
    fn from(s: &str) -> Self {
        XmlString::new(s)
    }
}

impl From<&String> for XmlString {
    fn from(s: &String) -> Self {
        XmlString::new(s)
    }
}

impl From<String> for XmlString {
    fn from(s: String) -> Self {
        XmlString::new(s)
    }
}

impl From<Cow<'_, str>> for XmlString {
    fn from(s: Cow<'_, str>) -> Self {
        XmlString::new(s)
    }
}

impl From<XmlString> for String {
    fn from(s: XmlString) -> Self {
        s.into_string()
    }
}

impl Deref for XmlString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl Borrow<str> for XmlString {
    fn borrow(&self) -> &str {
        &self.data
    }
}

impl PartialEq<str> for XmlString {
    fn eq(&self, other: &str) -> bool {
        &*self.data == other
    }
}

impl PartialEq<&str> for XmlString {
    fn eq(&self, other: &&str) -> bool {
        &*self.data == *other
    }
}

impl fmt::Debug for XmlString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.data, f)
    }
}

impl fmt::Display for XmlString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.data, f)
    }
}
