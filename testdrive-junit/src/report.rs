// Copyright (c) The testdrive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::{JunitReadError, SecondsParseError},
    read::read_test_suites,
};
use indexmap::{IndexMap, map::Entry};
use serde_json::Value;
use std::{collections::HashSet, fmt, io, str::FromStr};
use uuid::Uuid;

/// The test suites read from one or more JUnit XML documents.
///
/// Suites are kept in the order they were included. Suite names are unique across the whole
/// collection, even if the suites came from different documents.
#[derive(Clone, Debug, Default)]
pub struct TestSuites {
    suites: IndexMap<String, TestSuite>,
}

impl TestSuites {
    /// Creates a new, empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Includes every test suite in the JUnit XML document `xml`.
    ///
    /// Returns an error if the document is malformed, or if it defines a suite whose name is
    /// already included or appears twice in the document. On error, no suite from the document
    /// is added.
    pub fn include_str(&mut self, xml: &str) -> Result<&mut Self, JunitReadError> {
        let suites = read_test_suites(xml)?;
        let mut names = HashSet::new();
        if let Some(duplicate) = suites.iter().find(|suite| {
            self.suites.contains_key(&suite.name) || !names.insert(suite.name.as_str())
        }) {
            return Err(JunitReadError::DuplicateTestSuite {
                suite: duplicate.name.clone(),
            });
        }

        for suite in suites {
            self.add_test_suite(suite)?;
        }
        Ok(self)
    }

    /// Includes every test suite in the JUnit XML document read from `reader`.
    pub fn include_reader(&mut self, mut reader: impl io::Read) -> Result<&mut Self, JunitReadError> {
        let mut xml = String::new();
        reader
            .read_to_string(&mut xml)
            .map_err(|error| quick_xml::Error::Io(error.into()))?;
        self.include_str(&xml)
    }

    /// Adds a test suite, failing if a suite with the same name is already present.
    pub fn add_test_suite(&mut self, suite: TestSuite) -> Result<&mut Self, JunitReadError> {
        match self.suites.entry(suite.name.clone()) {
            Entry::Occupied(_) => Err(JunitReadError::DuplicateTestSuite { suite: suite.name }),
            Entry::Vacant(entry) => {
                entry.insert(suite);
                Ok(self)
            }
        }
    }

    /// Returns the suite with the given name.
    pub fn get(&self, name: &str) -> Option<&TestSuite> {
        self.suites.get(name)
    }

    /// Iterates over suites in inclusion order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &TestSuite> {
        self.suites.values()
    }

    /// Returns the number of suites.
    pub fn len(&self) -> usize {
        self.suites.len()
    }

    /// Returns true if no suites have been included.
    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }
}

/// Represents a single `<testsuite>` element.
///
/// Test cases are kept in document order, and case names are unique within the suite.
#[derive(Clone, Debug)]
pub struct TestSuite {
    /// The name of this test suite.
    pub name: String,

    /// Counts, host and timing recorded on the `<testsuite>` element.
    pub metadata: SuiteMetadata,

    cases: IndexMap<String, TestCase>,
}

impl TestSuite {
    /// Creates a new, empty `TestSuite`.
    pub fn new(name: impl Into<String>, metadata: SuiteMetadata) -> Self {
        Self {
            name: name.into(),
            metadata,
            cases: IndexMap::new(),
        }
    }

    /// Adds a test case, failing if a case with the same name is already present.
    pub fn add_test_case(&mut self, case: TestCase) -> Result<&mut Self, JunitReadError> {
        match self.cases.entry(case.name.clone()) {
            Entry::Occupied(_) => Err(JunitReadError::DuplicateTestCase {
                suite: self.name.clone(),
                case: case.name,
            }),
            Entry::Vacant(entry) => {
                entry.insert(case);
                Ok(self)
            }
        }
    }

    /// Returns the case with the given name.
    pub fn get(&self, name: &str) -> Option<&TestCase> {
        self.cases.get(name)
    }

    /// Iterates over test cases in document order.
    pub fn cases(&self) -> impl ExactSizeIterator<Item = &TestCase> {
        self.cases.values()
    }
}

/// Metadata recorded on a `<testsuite>` element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SuiteMetadata {
    /// The total number of tests in the suite.
    pub tests: usize,

    /// The number of tests that errored.
    pub errors: usize,

    /// The number of tests that failed.
    pub failures: usize,

    /// The number of tests that were skipped.
    pub skipped: usize,

    /// The host the suite ran on.
    pub hostname: Option<String>,

    /// The time at which the suite began execution, as recorded.
    pub timestamp: Option<String>,

    /// The overall time taken by the suite.
    pub time: Option<Seconds>,
}

impl SuiteMetadata {
    /// The number of tests that neither failed nor errored.
    pub fn successes(&self) -> usize {
        self.tests.saturating_sub(self.errors + self.failures)
    }
}

/// A unique identifier for a test case, generated when the case is created.
///
/// Used to build anchors and cross-references that cannot collide within a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CaseId(Uuid);

impl CaseId {
    /// Generates a new random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CaseId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Represents a single `<testcase>` element.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct TestCase {
    /// The generated identifier of this case.
    pub id: CaseId,

    /// The name of the test case.
    pub name: String,

    /// The "classname" of the test case, which names the suite it belongs to.
    pub classname: Option<String>,

    /// The time at which this test case began execution, as recorded.
    pub timestamp: Option<String>,

    /// The time it took to execute this test case.
    pub time: Option<Seconds>,

    /// The outcome of this test case.
    pub result: CaseResult,

    /// Data written to standard output while the test case was executed.
    pub system_out: Option<String>,

    /// Custom properties recorded for this test case. Keys are unique.
    pub properties: IndexMap<String, String>,
}

impl TestCase {
    /// Property holding the identifier of a test's specification.
    pub const TEST_ID_PROPERTY: &'static str = "test_id";

    /// Creates a new test case with a freshly generated id.
    pub fn new(name: impl Into<String>, result: CaseResult) -> Self {
        Self {
            id: CaseId::new(),
            name: name.into(),
            classname: None,
            timestamp: None,
            time: None,
            result,
            system_out: None,
            properties: IndexMap::new(),
        }
    }

    /// Sets the classname of the test.
    pub fn set_classname(&mut self, classname: impl Into<String>) -> &mut Self {
        self.classname = Some(classname.into());
        self
    }

    /// Sets the start timestamp for the test case.
    pub fn set_timestamp(&mut self, timestamp: impl Into<String>) -> &mut Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Sets the time taken for the test case.
    pub fn set_time(&mut self, time: Seconds) -> &mut Self {
        self.time = Some(time);
        self
    }

    /// Sets standard output.
    pub fn set_system_out(&mut self, system_out: impl Into<String>) -> &mut Self {
        self.system_out = Some(system_out.into());
        self
    }

    /// Sets a property, replacing any earlier value for the same name.
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Returns the `test_id` property, if recorded.
    pub fn test_id(&self) -> Option<&str> {
        self.properties
            .get(Self::TEST_ID_PROPERTY)
            .map(String::as_str)
    }

    /// Fills in timing from standard output if either the timestamp or the time is missing.
    ///
    /// Output that is a JSON object with a non-empty `timestamp` replaces both the timestamp and
    /// the time (from its `duration` field). A numeric timestamp is kept as its JSON text.
    /// Anything else leaves timing as is.
    pub fn backfill_timing_from_output(&mut self) -> &mut Self {
        let timestamp_missing = self.timestamp.as_deref().is_none_or(str::is_empty);
        if !timestamp_missing && self.time.is_some() {
            return self;
        }
        let Some(output) = self.system_out.as_deref() else {
            return self;
        };
        let Ok(Value::Object(object)) = serde_json::from_str::<Value>(output) else {
            return self;
        };
        let timestamp = match object.get("timestamp") {
            Some(Value::String(timestamp)) if !timestamp.is_empty() => timestamp.clone(),
            Some(Value::Number(timestamp)) => timestamp.to_string(),
            _ => return self,
        };
        self.timestamp = Some(timestamp);
        self.time = object.get("duration").and_then(Seconds::from_json);
        self
    }
}

/// The outcome of a test case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaseResult {
    /// The test passed.
    Success,

    /// The test failed in an expected way: a `<failure>` element was present.
    Failure {
        /// The `message` of the failure, if any.
        reason: Option<String>,
    },

    /// The test failed in an unexpected way: an `<error>` element was present.
    Error {
        /// The `message` of the error, if any.
        reason: Option<String>,
    },
}

impl CaseResult {
    /// Returns the recorded reason for a failure or error.
    pub fn reason(&self) -> Option<&str> {
        match self {
            CaseResult::Success => None,
            CaseResult::Failure { reason } | CaseResult::Error { reason } => reason.as_deref(),
        }
    }

    /// Returns the lowercase name of this outcome.
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseResult::Success => "success",
            CaseResult::Failure { .. } => "failure",
            CaseResult::Error { .. } => "error",
        }
    }
}

/// A duration in seconds, kept as the exact decimal text it was recorded with.
///
/// Timings are never converted to binary floating point, so `0.10` stays `0.10`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Seconds(Box<str>);

impl Seconds {
    /// Returns the decimal text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Converts a JSON number or numeric string into seconds.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.to_string().parse().ok(),
            Value::String(text) => text.parse().ok(),
            _ => None,
        }
    }
}

impl FromStr for Seconds {
    type Err = SecondsParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let text = input.trim();
        if is_decimal(text) {
            Ok(Self(text.into()))
        } else {
            Err(SecondsParseError::new(input))
        }
    }
}

impl fmt::Display for Seconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// [+-] digits [. digits] [(e|E) [+-] digits], with at least one mantissa digit.
fn is_decimal(text: &str) -> bool {
    let text = text.strip_prefix(['+', '-']).unwrap_or(text);
    let (mantissa, exponent) = match text.find(['e', 'E']) {
        Some(index) => (&text[..index], Some(&text[index + 1..])),
        None => (text, None),
    };
    let (integral, fractional) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    let mantissa_ok = !(integral.is_empty() && fractional.is_empty())
        && all_digits(integral)
        && all_digits(fractional);
    let exponent_ok = exponent.is_none_or(|exponent| {
        let digits = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
        !digits.is_empty() && all_digits(digits)
    });
    mantissa_ok && exponent_ok
}
