// Copyright (c) The testdrive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read JUnit XML into [`TestSuite`]s.

use crate::{CaseResult, JunitReadError, Seconds, SuiteMetadata, TestCase, TestSuite};
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};

static TESTSUITES_TAG: &str = "testsuites";
static TESTSUITE_TAG: &str = "testsuite";
static TESTCASE_TAG: &str = "testcase";
static PROPERTIES_TAG: &str = "properties";
static PROPERTY_TAG: &str = "property";
static FAILURE_TAG: &str = "failure";
static ERROR_TAG: &str = "error";
static SYSTEM_OUT_TAG: &str = "system-out";

pub(crate) fn read_test_suites(xml: &str) -> Result<Vec<TestSuite>, JunitReadError> {
    let root = read_element_tree(xml)?;

    let suites: Vec<&Element> = if root.name == TESTSUITE_TAG {
        vec![&root]
    } else {
        // Usually the root is <testsuites>, but any other root is searched the same way.
        root.children_named(TESTSUITE_TAG).collect()
    };
    if root.name != TESTSUITES_TAG && root.name != TESTSUITE_TAG {
        tracing::debug!("unexpected JUnit root element `{}`", root.name);
    }

    suites.into_iter().map(read_test_suite).collect()
}

fn read_test_suite(element: &Element) -> Result<TestSuite, JunitReadError> {
    let name = element.required_attr(TESTSUITE_TAG, "name")?;
    let metadata = SuiteMetadata {
        tests: element.count_attr("tests")?,
        errors: element.count_attr("errors")?,
        failures: element.count_attr("failures")?,
        skipped: element.count_attr("skipped")?,
        hostname: element.attr("hostname").map(str::to_owned),
        timestamp: element.attr("timestamp").map(str::to_owned),
        time: element.seconds_attr("time")?,
    };

    let mut suite = TestSuite::new(name, metadata);
    for child in element.children_named(TESTCASE_TAG) {
        suite.add_test_case(read_test_case(child)?)?;
    }
    Ok(suite)
}

fn read_test_case(element: &Element) -> Result<TestCase, JunitReadError> {
    let name = element.required_attr(TESTCASE_TAG, "name")?;

    // A failure takes precedence over an error.
    let result = if let Some(failure) = element.child(FAILURE_TAG) {
        CaseResult::Failure {
            reason: failure.attr("message").map(str::to_owned),
        }
    } else if let Some(error) = element.child(ERROR_TAG) {
        CaseResult::Error {
            reason: error.attr("message").map(str::to_owned),
        }
    } else {
        CaseResult::Success
    };

    let mut case = TestCase::new(name, result);
    if let Some(classname) = element.attr("classname") {
        case.set_classname(classname);
    }
    if let Some(timestamp) = element.attr("timestamp") {
        case.set_timestamp(timestamp);
    }
    if let Some(time) = element.seconds_attr("time")? {
        case.set_time(time);
    }

    if let Some(properties) = element.child(PROPERTIES_TAG) {
        for property in properties.children_named(PROPERTY_TAG) {
            let name = property.required_attr(PROPERTY_TAG, "name")?;
            let value = property
                .attr("value")
                .unwrap_or_else(|| property.text.trim());
            case.set_property(name, value);
        }
    }

    if let Some(system_out) = element.child(SYSTEM_OUT_TAG) {
        if !system_out.text.is_empty() {
            case.set_system_out(system_out.text.as_str());
        }
    }

    case.backfill_timing_from_output();
    Ok(case)
}

/// A minimal element tree: just enough structure to walk a JUnit document.
#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn from_start(start: &BytesStart<'_>, reader: &Reader<&[u8]>) -> quick_xml::Result<Self> {
        let name = reader.decoder().decode(start.name().as_ref())?.into_owned();
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute?;
            let key = reader.decoder().decode(attribute.key.as_ref())?.into_owned();
            let value = attribute.decode_and_unescape_value(reader)?.into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            ..Default::default()
        })
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn required_attr(
        &self,
        element: &'static str,
        attribute: &'static str,
    ) -> Result<&str, JunitReadError> {
        self.attr(attribute)
            .ok_or(JunitReadError::MissingAttribute { element, attribute })
    }

    fn count_attr(&self, attribute: &'static str) -> Result<usize, JunitReadError> {
        match self.attr(attribute) {
            Some(value) => {
                value
                    .trim()
                    .parse()
                    .map_err(|error| JunitReadError::InvalidCount {
                        attribute,
                        value: value.to_owned(),
                        error,
                    })
            }
            None => Ok(0),
        }
    }

    fn seconds_attr(&self, attribute: &str) -> Result<Option<Seconds>, JunitReadError> {
        self.attr(attribute)
            .map(str::parse::<Seconds>)
            .transpose()
            .map_err(JunitReadError::from)
    }

    fn child<'a>(&'a self, name: &'a str) -> Option<&'a Element> {
        self.children_named(name).next()
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |child| child.name == name)
    }
}

fn read_element_tree(xml: &str) -> Result<Element, JunitReadError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    let mut finish = |element: Element, stack: &mut Vec<Element>| match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                root = Some(element);
            }
        }
    };

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(Element::from_start(&start, &reader)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start, &reader)?;
                finish(element, &mut stack);
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    finish(element, &mut stack);
                }
            }
            Event::Text(text) => {
                if let Some(element) = stack.last_mut() {
                    element.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(cdata) => {
                if let Some(element) = stack.last_mut() {
                    element.text.push_str(&reader.decoder().decode(&cdata)?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(quick_xml::Error::UnexpectedEof(format!("</{}>", open.name)).into());
    }
    root.ok_or(JunitReadError::NoRootElement)
}
