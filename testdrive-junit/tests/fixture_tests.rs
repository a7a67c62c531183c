// Copyright (c) The testdrive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use pretty_assertions::assert_eq;
use std::fs::File;
use testdrive_junit::{CaseResult, JunitReadError, TestSuites};

fn fixture(name: &str) -> File {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    File::open(&path).unwrap_or_else(|error| panic!("opening fixture {path} failed: {error}"))
}

#[test]
fn basic_report() {
    let mut suites = TestSuites::new();
    suites
        .include_reader(fixture("basic_report.xml"))
        .expect("basic_report.xml is valid");

    let suite_names: Vec<_> = suites.iter().map(|suite| suite.name.as_str()).collect();
    assert_eq!(suite_names, ["suite0", "suite1"]);

    let suite0 = suites.get("suite0").expect("suite0 exists");
    assert_eq!(suite0.metadata.tests, 3);
    assert_eq!(suite0.metadata.successes(), 1);
    assert_eq!(suite0.metadata.hostname.as_deref(), Some("bench-01"));
    assert_eq!(
        suite0.metadata.time.as_ref().map(|time| time.to_string()),
        Some("12.340".to_owned())
    );

    let case_names: Vec<_> = suite0.cases().map(|case| case.name.as_str()).collect();
    assert_eq!(case_names, ["case0", "case1", "case2"]);

    let case0 = suite0.get("case0").unwrap();
    assert_eq!(case0.test_id(), Some("https://example.com/tests/case0"));
    assert_eq!(
        case0.system_out.as_deref(),
        Some("plain output line\nsecond line")
    );

    let case1 = suite0.get("case1").unwrap();
    assert_eq!(case1.result.reason(), Some("value out of range"));
    assert_eq!(case1.result.as_str(), "failure");
    // The timestamp is missing and the output isn't JSON, so the time stays as recorded.
    assert_eq!(case1.timestamp, None);
    assert_eq!(
        case1.time.as_ref().map(|time| time.to_string()),
        Some("2.5".to_owned())
    );

    let case2 = suite0.get("case2").unwrap();
    assert_eq!(
        case2.result,
        CaseResult::Error {
            reason: Some("device unreachable".to_owned())
        }
    );
    assert_eq!(case2.timestamp.as_deref(), Some("2024-05-01T10:00:05"));
    assert_eq!(
        case2.time.as_ref().map(|time| time.to_string()),
        Some("8.84".to_owned())
    );

    let suite1 = suites.get("suite1").unwrap();
    assert_eq!(suite1.metadata.skipped, 1);
    assert_eq!(suite1.metadata.hostname, None);
    assert_eq!(suite1.get("case0").unwrap().result, CaseResult::Success);
}

#[test]
fn duplicate_case_in_suite() {
    let error = TestSuites::new()
        .include_reader(fixture("duplicate_case.xml"))
        .map(|_| ())
        .unwrap_err();
    assert_eq!(
        error.to_string(),
        "duplicate test case `repeated` in test suite `suite0`"
    );
}

#[test]
fn duplicate_suite_across_documents() {
    let mut suites = TestSuites::new();
    suites
        .include_reader(fixture("basic_report.xml"))
        .expect("basic_report.xml is valid");
    let error = suites
        .include_reader(fixture("single_suite.xml"))
        .map(|_| ())
        .unwrap_err();
    assert!(
        matches!(&error, JunitReadError::DuplicateTestSuite { suite } if suite == "suite0"),
        "unexpected error: {error}"
    );
}
