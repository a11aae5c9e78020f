// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Names of tests, and how they map onto JUnit `classname` and `name` attributes.

use std::fmt;

/// Placeholder used when a test does not carry enough information to name it.
pub const UNKNOWN_NAME: &str = "UNKNOWN";

/// Identifies a single test as the host engine describes it.
///
/// Every field is optional. Missing fields are resolved to placeholders when a case is recorded:
/// see [`Self::classname`] and [`Self::name`].
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct TestIdentity {
    /// The module the test is defined in, e.g. `pkg::module` or `pkg.module`.
    pub module_path: Option<String>,

    /// The group (class, fixture or struct) the test belongs to.
    pub class_name: Option<String>,

    /// The test method or function name.
    pub method_name: Option<String>,

    /// A free-form description, used as the name when there is no method name.
    ///
    /// Errors raised outside any test method, such as a failing suite fixture, are reported
    /// under a description-only identity.
    pub description: Option<String>,
}

impl TestIdentity {
    /// Creates a fully-specified identity.
    pub fn new(
        module_path: impl Into<String>,
        class_name: impl Into<String>,
        method_name: impl Into<String>,
    ) -> Self {
        Self {
            module_path: Some(module_path.into()),
            class_name: Some(class_name.into()),
            method_name: Some(method_name.into()),
            description: None,
        }
    }

    /// Creates an identity that only has a description.
    pub fn from_description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    /// Sets the class name.
    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Returns the dot-joined module and class name.
    ///
    /// Rust `::` path separators are rendered as `.`, the JUnit convention. If neither the module
    /// nor the class is known, this is [`UNKNOWN_NAME`].
    pub fn classname(&self) -> String {
        let parts: Vec<String> = [self.module_path.as_deref(), self.class_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .map(|part| part.replace("::", "."))
            .collect();
        if parts.is_empty() {
            UNKNOWN_NAME.to_owned()
        } else {
            parts.join(".")
        }
    }

    /// Returns the method name, falling back to the description and then to [`UNKNOWN_NAME`].
    pub fn name(&self) -> &str {
        self.method_name
            .as_deref()
            .or(self.description.as_deref())
            .unwrap_or(UNKNOWN_NAME)
    }
}

impl fmt::Display for TestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.method_name, &self.description) {
            (None, Some(description)) => write!(f, "{description}"),
            _ => write!(f, "{} ({})", self.name(), self.classname()),
        }
    }
}
