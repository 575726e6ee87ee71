// Copyright (c) The parse2junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use parse2junit_xml::{NonSuccessKind, Property, Report, TestCase, TestCaseStatus, TestSuite};
use pretty_assertions::assert_eq;
use std::time::Duration;

#[test]
fn basic_report_serializes() {
    let xml = basic_report().to_string().expect("serializing basic_report succeeds");

    assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    assert!(xml.ends_with("</testsuites>\n"));
    assert!(xml.contains(
        r#"<testsuites name="my-test-run" tests="4" failures="1" errors="1" time="42.250">"#
    ));
    assert!(xml.contains(
        r#"<testsuite name="testsuite0" tests="4" disabled="1" errors="1" failures="1" hostname="builder-1">"#
    ));
    assert!(xml.contains(r#"<property name="env" value="FOOBAR"/>"#));
    assert!(xml.contains(r#"<failure message="testcase1-message">this is the failure description</failure>"#));
    assert!(xml.contains(r#"<skipped message="skipped message" type="skipped type"/>"#));
}

#[test]
fn basic_report_round_trips() {
    let report = basic_report();
    let xml = report.to_string().expect("serializing basic_report succeeds");
    let read = Report::deserialize_str(&xml).expect("deserializing basic_report succeeds");

    assert_eq!(read, report);
}

fn basic_report() -> Report {
    let mut report = Report::new("my-test-run");
    report.set_time(Duration::from_millis(42_250));

    let mut test_suite = TestSuite::new("testsuite0");
    test_suite.set_hostname("builder-1");

    let test_case_status = TestCaseStatus::success();
    let mut test_case = TestCase::new("testcase0", test_case_status);
    test_case.set_system_out("testcase0-output");
    test_suite.add_test_case(test_case);

    let mut test_case_status = TestCaseStatus::non_success(NonSuccessKind::Failure);
    test_case_status
        .set_description("this is the failure description")
        .set_message("testcase1-message");
    let mut test_case = TestCase::new("testcase1", test_case_status);
    test_case
        .set_system_err("some sort of failure output")
        .set_time(Duration::from_millis(4_500));
    test_suite.add_test_case(test_case);

    let mut test_case_status = TestCaseStatus::non_success(NonSuccessKind::Error);
    test_case_status
        .set_description("testcase2 error description")
        .set_type("error type");
    let mut test_case = TestCase::new("testcase2", test_case_status);
    test_case.set_time(Duration::from_millis(125));
    test_suite.add_test_case(test_case);

    let mut test_case_status = TestCaseStatus::skipped();
    test_case_status
        .set_type("skipped type")
        .set_message("skipped message");
    // no description to test that.
    let mut test_case = TestCase::new("testcase3", test_case_status);
    test_case
        .set_assertions(20)
        .set_system_out("testcase3 output")
        .set_system_err("testcase3 error");
    test_suite.add_test_case(test_case);

    test_suite.add_property(Property::new("env", "FOOBAR"));

    report.add_test_suite(test_suite);

    report
}
