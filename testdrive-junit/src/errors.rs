// Copyright (c) The testdrive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

/// An error that occurs while reading a JUnit XML document into
/// [`TestSuites`](crate::TestSuites).
///
/// Returned by [`TestSuites::include_str`](crate::TestSuites::include_str) and
/// [`TestSuites::include_reader`](crate::TestSuites::include_reader).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum JunitReadError {
    /// The document is not well-formed XML, or could not be read.
    #[error("error reading JUnit XML")]
    Xml {
        #[from]
        error: quick_xml::Error,
    },

    /// The document has no root element.
    #[error("JUnit XML document has no root element")]
    NoRootElement,

    /// A required attribute is missing from an element.
    #[error("<{element}> element is missing required attribute `{attribute}`")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    /// A count attribute on `<testsuite>` is not a non-negative integer.
    #[error("attribute `{attribute}` has invalid count `{value}`")]
    InvalidCount {
        attribute: &'static str,
        value: String,
        #[source]
        error: std::num::ParseIntError,
    },

    /// A `time` attribute is not a decimal number of seconds.
    #[error(transparent)]
    InvalidSeconds(#[from] SecondsParseError),

    /// Two test cases in the same suite share a name.
    #[error("duplicate test case `{case}` in test suite `{suite}`")]
    DuplicateTestCase { suite: String, case: String },

    /// Two test suites in the same collection share a name.
    #[error("duplicate test suite `{suite}`")]
    DuplicateTestSuite { suite: String },
}

/// An error returned while parsing a [`Seconds`](crate::Seconds) value from a string.
#[derive(Clone, Debug, Error)]
#[error("invalid duration `{input}`: expected a decimal number of seconds")]
pub struct SecondsParseError {
    input: String,
}

impl SecondsParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }

    /// Returns the input that failed to parse.
    pub fn input(&self) -> &str {
        &self.input
    }
}
