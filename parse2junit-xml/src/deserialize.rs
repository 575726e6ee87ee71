// Copyright (c) The parse2junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deserialize a `Report`.
//!
//! Reports come from many different producers, so reading is lenient about
//! structure: unknown elements are skipped and counters are recomputed from
//! the testcases that were actually found. Malformed XML is still an error.

use crate::{
    serialize::{
        ERROR_TAG, FAILURE_TAG, PROPERTIES_TAG, PROPERTY_TAG, SKIPPED_TAG, SYSTEM_ERR_TAG,
        SYSTEM_OUT_TAG, TESTCASE_TAG, TESTSUITES_TAG, TESTSUITE_TAG,
    },
    DeserializeError, NonSuccessKind, Property, Report, TestCase, TestCaseStatus, TestSuite,
};
use chrono::{DateTime, FixedOffset};
use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};
use std::time::Duration;

pub(crate) fn deserialize_report(input: &str) -> Result<Report, DeserializeError> {
    let mut de = Deserializer::new(input);

    loop {
        match de.next_event()? {
            Event::Start(start) => return de.root(&start, false),
            Event::Empty(start) => return de.root(&start, true),
            Event::Eof => return Err(DeserializeError::MissingRoot),
            // Declarations, comments, doctypes and whitespace before the root.
            _ => {}
        }
    }
}

struct Deserializer<'a> {
    reader: Reader<&'a [u8]>,
}

impl<'a> Deserializer<'a> {
    fn new(input: &'a str) -> Self {
        let mut reader = Reader::from_str(input);
        reader.check_end_names(true);
        Self { reader }
    }

    fn next_event(&mut self) -> Result<Event<'a>, DeserializeError> {
        Ok(self.reader.read_event()?)
    }

    fn root(&mut self, start: &BytesStart<'a>, empty: bool) -> Result<Report, DeserializeError> {
        match start.name().as_ref() {
            b"testsuites" => self.report(start, empty),
            b"testsuite" => {
                let mut report = Report::new("");
                report.add_test_suite(self.test_suite(start, empty)?);
                Ok(report)
            }
            other => Err(DeserializeError::UnexpectedRoot {
                name: String::from_utf8_lossy(other).into_owned(),
            }),
        }
    }

    fn report(&mut self, start: &BytesStart<'a>, empty: bool) -> Result<Report, DeserializeError> {
        let mut report = Report::new("");
        for (key, value) in attributes(start)? {
            match key.as_str() {
                "name" => report.name = value,
                "time" => report.time = parse_time(TESTSUITES_TAG, &value)?,
                "timestamp" => report.timestamp = parse_timestamp(&value),
                // Counters are recomputed from the testcases.
                _ => {}
            }
        }
        if empty {
            return Ok(report);
        }

        loop {
            match self.next_event()? {
                Event::Start(child) => match child.name().as_ref() {
                    b"testsuite" => {
                        let test_suite = self.test_suite(&child, false)?;
                        report.add_test_suite(test_suite);
                    }
                    b"testsuites" => {
                        let nested = self.report(&child, false)?;
                        report.add_nested_report(nested);
                    }
                    _ => self.skip_element(&child)?,
                },
                Event::Empty(child) => match child.name().as_ref() {
                    b"testsuite" => {
                        let test_suite = self.test_suite(&child, true)?;
                        report.add_test_suite(test_suite);
                    }
                    b"testsuites" => {
                        let nested = self.report(&child, true)?;
                        report.add_nested_report(nested);
                    }
                    _ => {}
                },
                Event::End(_) => return Ok(report),
                Event::Eof => return Err(unexpected_eof(TESTSUITES_TAG)),
                _ => {}
            }
        }
    }

    fn test_suite(
        &mut self,
        start: &BytesStart<'a>,
        empty: bool,
    ) -> Result<TestSuite, DeserializeError> {
        let mut test_suite = TestSuite::new("");
        for (key, value) in attributes(start)? {
            match key.as_str() {
                "name" => test_suite.name = value,
                "time" => test_suite.time = parse_time(TESTSUITE_TAG, &value)?,
                "timestamp" => match parse_timestamp(&value) {
                    Some(timestamp) => test_suite.timestamp = Some(timestamp),
                    // Keep timestamps without an offset as they were written.
                    None => {
                        test_suite.extra.insert(key, value);
                    }
                },
                "tests" | "failures" | "errors" | "disabled" | "skipped" => {}
                _ => {
                    test_suite.extra.insert(key, value);
                }
            }
        }
        if empty {
            return Ok(test_suite);
        }

        loop {
            match self.next_event()? {
                Event::Start(child) => match child.name().as_ref() {
                    b"testcase" => {
                        let test_case = self.test_case(&child, false)?;
                        test_suite.add_test_case(test_case);
                    }
                    b"testsuite" => {
                        let nested = self.test_suite(&child, false)?;
                        test_suite.add_nested_test_suite(nested);
                    }
                    b"properties" => self.properties(&mut test_suite)?,
                    b"system-out" => {
                        let text = self.text(SYSTEM_OUT_TAG)?;
                        test_suite.set_system_out(text);
                    }
                    b"system-err" => {
                        let text = self.text(SYSTEM_ERR_TAG)?;
                        test_suite.set_system_err(text);
                    }
                    _ => self.skip_element(&child)?,
                },
                Event::Empty(child) => match child.name().as_ref() {
                    b"testcase" => {
                        let test_case = self.test_case(&child, true)?;
                        test_suite.add_test_case(test_case);
                    }
                    b"testsuite" => {
                        let nested = self.test_suite(&child, true)?;
                        test_suite.add_nested_test_suite(nested);
                    }
                    _ => {}
                },
                Event::End(_) => return Ok(test_suite),
                Event::Eof => return Err(unexpected_eof(TESTSUITE_TAG)),
                _ => {}
            }
        }
    }

    fn properties(&mut self, test_suite: &mut TestSuite) -> Result<(), DeserializeError> {
        loop {
            match self.next_event()? {
                Event::Empty(child) if child.name().as_ref() == b"property" => {
                    test_suite.add_property(property(&child)?);
                }
                Event::Start(child) if child.name().as_ref() == b"property" => {
                    let mut property = property(&child)?;
                    // Some producers put long values in the text node.
                    let text = self.text(PROPERTY_TAG)?;
                    if property.value.is_empty() {
                        property.value = text;
                    }
                    test_suite.add_property(property);
                }
                Event::Start(child) => self.skip_element(&child)?,
                Event::End(_) => return Ok(()),
                Event::Eof => return Err(unexpected_eof(PROPERTIES_TAG)),
                _ => {}
            }
        }
    }

    fn test_case(
        &mut self,
        start: &BytesStart<'a>,
        empty: bool,
    ) -> Result<TestCase, DeserializeError> {
        let mut test_case = TestCase::new("", TestCaseStatus::success());
        for (key, value) in attributes(start)? {
            match key.as_str() {
                "name" => test_case.name = value,
                "classname" => test_case.classname = Some(value),
                "time" => test_case.time = parse_time(TESTCASE_TAG, &value)?,
                "assertions" => {
                    let assertions = value.trim().parse().map_err(|_| {
                        DeserializeError::InvalidAttribute {
                            element: TESTCASE_TAG,
                            attribute: "assertions",
                            value: value.clone(),
                        }
                    })?;
                    test_case.assertions = Some(assertions);
                }
                "timestamp" => match parse_timestamp(&value) {
                    Some(timestamp) => test_case.timestamp = Some(timestamp),
                    None => {
                        test_case.extra.insert(key, value);
                    }
                },
                _ => {
                    test_case.extra.insert(key, value);
                }
            }
        }
        if empty {
            return Ok(test_case);
        }

        loop {
            let (child, child_empty) = match self.next_event()? {
                Event::Start(child) => (child, false),
                Event::Empty(child) => (child, true),
                Event::End(_) => return Ok(test_case),
                Event::Eof => return Err(unexpected_eof(TESTCASE_TAG)),
                _ => continue,
            };

            let (status, tag_name) = match child.name().as_ref() {
                b"failure" => (
                    TestCaseStatus::non_success(NonSuccessKind::Failure),
                    FAILURE_TAG,
                ),
                b"error" => (
                    TestCaseStatus::non_success(NonSuccessKind::Error),
                    ERROR_TAG,
                ),
                b"skipped" => (TestCaseStatus::skipped(), SKIPPED_TAG),
                b"system-out" | b"system-err" => {
                    let is_out = child.name().as_ref() == b"system-out";
                    if !child_empty {
                        let tag_name = if is_out { SYSTEM_OUT_TAG } else { SYSTEM_ERR_TAG };
                        let text = self.text(tag_name)?;
                        if is_out {
                            test_case.set_system_out(text);
                        } else {
                            test_case.set_system_err(text);
                        }
                    }
                    continue;
                }
                _ => {
                    if !child_empty {
                        self.skip_element(&child)?;
                    }
                    continue;
                }
            };

            let mut status = status;
            for (key, value) in attributes(&child)? {
                match key.as_str() {
                    "message" => {
                        status.set_message(value);
                    }
                    "type" => {
                        status.set_type(value);
                    }
                    _ => {}
                }
            }
            if !child_empty {
                let description = self.text(tag_name)?;
                if !description.trim().is_empty() {
                    status.set_description(description);
                }
            }

            // The first recorded outcome wins; later ones are usually reruns.
            if test_case.status == TestCaseStatus::Success {
                test_case.status = status;
            }
        }
    }

    /// Reads text and CDATA up to the end of the current element.
    ///
    /// Child elements are skipped, their text is not collected.
    fn text(&mut self, element: &'static str) -> Result<String, DeserializeError> {
        let mut text = String::new();
        loop {
            match self.next_event()? {
                Event::Text(t) => text.push_str(&t.unescape()?),
                Event::CData(cdata) => text.push_str(&String::from_utf8_lossy(&cdata)),
                Event::Start(child) => self.skip_element(&child)?,
                Event::End(_) => return Ok(text),
                Event::Eof => return Err(unexpected_eof(element)),
                _ => {}
            }
        }
    }

    fn skip_element(&mut self, start: &BytesStart<'a>) -> Result<(), DeserializeError> {
        let mut depth = 1usize;
        while depth > 0 {
            match self.next_event()? {
                Event::Start(_) => depth += 1,
                Event::End(_) => depth -= 1,
                Event::Eof => {
                    return Err(DeserializeError::UnexpectedEof {
                        element: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
                    })
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn attributes(start: &BytesStart<'_>) -> Result<Vec<(String, String)>, DeserializeError> {
    start
        .attributes()
        .map(|attr| {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            Ok((key, value))
        })
        .collect()
}

fn property(start: &BytesStart<'_>) -> Result<Property, DeserializeError> {
    let mut property = Property::new("", "");
    for (key, value) in attributes(start)? {
        match key.as_str() {
            "name" => property.name = value,
            "value" => property.value = value,
            _ => {}
        }
    }
    Ok(property)
}

fn parse_time(element: &'static str, value: &str) -> Result<Option<Duration>, DeserializeError> {
    // Some producers use thousands separators.
    let trimmed = value.trim().replace(',', "");
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .map(Some)
        .ok_or_else(|| DeserializeError::InvalidAttribute {
            element,
            attribute: "time",
            value: value.to_owned(),
        })
}

fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value.trim()).ok()
}

fn unexpected_eof(element: &'static str) -> DeserializeError {
    DeserializeError::UnexpectedEof {
        element: element.to_owned(),
    }
}
