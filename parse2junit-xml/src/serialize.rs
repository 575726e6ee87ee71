// Copyright (c) The parse2junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serialize a `Report`.

use crate::{
    report::strip_invalid_xml_chars, NonSuccessKind, Output, Property, Report, ReportEntry,
    TestCase, TestCaseStatus, TestSuite,
};
use quick_xml::{
    escape::escape,
    events::{attributes::Attribute, BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    name::QName,
    Writer,
};
use std::{
    borrow::Cow,
    io::{self, Write},
    time::Duration,
};

pub(crate) static TESTSUITES_TAG: &str = "testsuites";
pub(crate) static TESTSUITE_TAG: &str = "testsuite";
pub(crate) static TESTCASE_TAG: &str = "testcase";
pub(crate) static PROPERTIES_TAG: &str = "properties";
pub(crate) static PROPERTY_TAG: &str = "property";
pub(crate) static FAILURE_TAG: &str = "failure";
pub(crate) static ERROR_TAG: &str = "error";
pub(crate) static SKIPPED_TAG: &str = "skipped";
pub(crate) static SYSTEM_OUT_TAG: &str = "system-out";
pub(crate) static SYSTEM_ERR_TAG: &str = "system-err";

pub(crate) fn serialize_report(report: &Report, writer: impl io::Write) -> quick_xml::Result<()> {
    let mut writer = Writer::new_with_indent(writer, b' ', 4);

    let decl = BytesDecl::new("1.0", Some("UTF-8"), None);
    writer.write_event(Event::Decl(decl))?;

    serialize_report_impl(report, &mut writer)?;

    // Add a trailing newline.
    writer.get_mut().write_all(b"\n")?;
    Ok(())
}

fn serialize_report_impl(
    report: &Report,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    // Use the destructuring syntax to ensure that all fields are handled.
    let Report {
        name,
        timestamp,
        time,
        tests,
        failures,
        errors,
        entries,
    } = report;

    let mut testsuites_tag = BytesStart::new(TESTSUITES_TAG);
    testsuites_tag.push_attribute(xml_attribute("name", name));
    testsuites_tag.push_attribute(xml_attribute("tests", &tests.to_string()));
    testsuites_tag.push_attribute(xml_attribute("failures", &failures.to_string()));
    testsuites_tag.push_attribute(xml_attribute("errors", &errors.to_string()));
    if let Some(time) = time {
        testsuites_tag.push_attribute(xml_attribute("time", &serialize_time(time)));
    }
    if let Some(timestamp) = timestamp {
        testsuites_tag.push_attribute(xml_attribute(
            "timestamp",
            &timestamp.format("%+").to_string(),
        ));
    }
    writer.write_event(Event::Start(testsuites_tag))?;

    for entry in entries {
        match entry {
            ReportEntry::TestSuite(test_suite) => serialize_test_suite(test_suite, writer)?,
            ReportEntry::Report(nested) => serialize_report_impl(nested, writer)?,
        }
    }

    serialize_end_tag(TESTSUITES_TAG, writer)
}

fn serialize_test_suite(
    test_suite: &TestSuite,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    // Use the destructuring syntax to ensure that all fields are handled.
    let TestSuite {
        name,
        tests,
        disabled,
        errors,
        failures,
        time,
        timestamp,
        test_cases,
        properties,
        system_out,
        system_err,
        extra,
        test_suites,
    } = test_suite;

    let mut testsuite_tag = BytesStart::new(TESTSUITE_TAG);
    testsuite_tag.push_attribute(xml_attribute("name", name));
    testsuite_tag.push_attribute(xml_attribute("tests", &tests.to_string()));
    testsuite_tag.push_attribute(xml_attribute("disabled", &disabled.to_string()));
    testsuite_tag.push_attribute(xml_attribute("errors", &errors.to_string()));
    testsuite_tag.push_attribute(xml_attribute("failures", &failures.to_string()));
    if let Some(time) = time {
        testsuite_tag.push_attribute(xml_attribute("time", &serialize_time(time)));
    }
    if let Some(timestamp) = timestamp {
        testsuite_tag.push_attribute(xml_attribute(
            "timestamp",
            &timestamp.format("%+").to_string(),
        ));
    }
    for (k, v) in extra {
        testsuite_tag.push_attribute(xml_attribute(k, v));
    }

    writer.write_event(Event::Start(testsuite_tag))?;

    if !properties.is_empty() {
        serialize_empty_start_tag(PROPERTIES_TAG, writer)?;
        for property in properties {
            serialize_property(property, writer)?;
        }
        serialize_end_tag(PROPERTIES_TAG, writer)?;
    }

    for test_case in test_cases {
        serialize_test_case(test_case, writer)?;
    }

    for nested in test_suites {
        serialize_test_suite(nested, writer)?;
    }

    if let Some(system_out) = system_out {
        serialize_output(system_out, SYSTEM_OUT_TAG, writer)?;
    }
    if let Some(system_err) = system_err {
        serialize_output(system_err, SYSTEM_ERR_TAG, writer)?;
    }

    serialize_end_tag(TESTSUITE_TAG, writer)
}

fn serialize_property(
    property: &Property,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    let mut property_tag = BytesStart::new(PROPERTY_TAG);
    property_tag.push_attribute(xml_attribute("name", &property.name));
    property_tag.push_attribute(xml_attribute("value", &property.value));

    writer.write_event(Event::Empty(property_tag))
}

fn serialize_test_case(
    test_case: &TestCase,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    let TestCase {
        name,
        classname,
        assertions,
        timestamp,
        time,
        status,
        system_out,
        system_err,
        extra,
    } = test_case;

    let mut testcase_tag = BytesStart::new(TESTCASE_TAG);
    testcase_tag.push_attribute(xml_attribute("name", name));
    if let Some(classname) = classname {
        testcase_tag.push_attribute(xml_attribute("classname", classname));
    }
    if let Some(assertions) = assertions {
        testcase_tag.push_attribute(xml_attribute("assertions", &assertions.to_string()));
    }
    if let Some(timestamp) = timestamp {
        testcase_tag.push_attribute(xml_attribute(
            "timestamp",
            &timestamp.format("%+").to_string(),
        ));
    }
    if let Some(time) = time {
        testcase_tag.push_attribute(xml_attribute("time", &serialize_time(time)));
    }
    for (k, v) in extra {
        testcase_tag.push_attribute(xml_attribute(k, v));
    }
    writer.write_event(Event::Start(testcase_tag))?;

    match status {
        TestCaseStatus::Success => {}
        TestCaseStatus::NonSuccess {
            kind,
            message,
            ty,
            description,
        } => {
            let tag_name = match kind {
                NonSuccessKind::Failure => FAILURE_TAG,
                NonSuccessKind::Error => ERROR_TAG,
            };
            serialize_status(
                message.as_deref(),
                ty.as_deref(),
                description.as_deref(),
                tag_name,
                writer,
            )?;
        }
        TestCaseStatus::Skipped {
            message,
            ty,
            description,
        } => {
            serialize_status(
                message.as_deref(),
                ty.as_deref(),
                description.as_deref(),
                SKIPPED_TAG,
                writer,
            )?;
        }
    }

    if let Some(system_out) = system_out {
        serialize_output(system_out, SYSTEM_OUT_TAG, writer)?;
    }
    if let Some(system_err) = system_err {
        serialize_output(system_err, SYSTEM_ERR_TAG, writer)?;
    }

    serialize_end_tag(TESTCASE_TAG, writer)
}

fn serialize_status(
    message: Option<&str>,
    ty: Option<&str>,
    description: Option<&str>,
    tag_name: &'static str,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    let mut tag = BytesStart::new(tag_name);
    if let Some(message) = message {
        tag.push_attribute(xml_attribute("message", message));
    }
    if let Some(ty) = ty {
        tag.push_attribute(xml_attribute("type", ty));
    }

    match description {
        Some(description) => {
            writer.write_event(Event::Start(tag))?;
            let description = strip_invalid_xml_chars(description);
            writer.write_event(Event::Text(BytesText::new(&description)))?;
            serialize_end_tag(tag_name, writer)
        }
        None => writer.write_event(Event::Empty(tag)),
    }
}

fn serialize_output(
    output: &Output,
    tag_name: &'static str,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    serialize_empty_start_tag(tag_name, writer)?;

    let text = BytesText::new(output.as_str());
    writer.write_event(Event::Text(text))?;

    serialize_end_tag(tag_name, writer)
}

fn serialize_empty_start_tag(
    tag_name: &'static str,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag_name)))
}

fn serialize_end_tag(
    tag_name: &'static str,
    writer: &mut Writer<impl io::Write>,
) -> quick_xml::Result<()> {
    writer.write_event(Event::End(BytesEnd::new(tag_name)))
}

// Attribute values are escaped by hand so that line breaks and tabs survive as
// character references; a parser would otherwise normalize them to spaces.
fn xml_attribute<'a>(key: &'a str, value: &str) -> Attribute<'a> {
    let value = strip_invalid_xml_chars(value);
    let mut escaped = String::with_capacity(value.len());
    for c in escape(value.as_str()).chars() {
        match c {
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            '\t' => escaped.push_str("&#9;"),
            c => escaped.push(c),
        }
    }
    Attribute {
        key: QName(key.as_bytes()),
        value: Cow::Owned(escaped.into_bytes()),
    }
}

// Serialize time as seconds with 3 decimal points.
fn serialize_time(time: &Duration) -> String {
    format!("{:.3}", time.as_secs_f64())
}
