// Copyright (c) The parse2junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    deserialize::deserialize_report, serialize::serialize_report, DeserializeError,
    SerializeError,
};
use chrono::{DateTime, FixedOffset};
use indexmap::map::IndexMap;
use std::{io, mem, time::Duration};

static HOSTNAME_ATTR: &str = "hostname";

/// The root element of a JUnit report.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Report {
    /// The name of this report.
    pub name: String,

    /// The time at which the first test in this report began execution.
    ///
    /// This is not part of the JUnit spec, but may be useful for some tools.
    pub timestamp: Option<DateTime<FixedOffset>>,

    /// The overall time taken by the test suite.
    ///
    /// This is serialized as the number of seconds.
    pub time: Option<Duration>,

    /// The total number of tests from all testsuites.
    pub tests: usize,

    /// The total number of failures from all testsuites.
    pub failures: usize,

    /// The total number of errors from all testsuites.
    pub errors: usize,

    /// The children of this report, in document order.
    ///
    /// Reports read from disk may nest `<testsuites>` inside `<testsuites>`.
    /// Reports built with [`Self::add_test_suite`] only ever contain
    /// [`ReportEntry::TestSuite`].
    pub entries: Vec<ReportEntry>,
}

/// A child element of a `<testsuites>` element.
#[derive(Clone, Debug, PartialEq)]
pub enum ReportEntry {
    /// A `<testsuite>` element.
    TestSuite(TestSuite),

    /// A nested `<testsuites>` element.
    Report(Report),
}

impl Report {
    /// Creates a new `Report` with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timestamp: None,
            time: None,
            tests: 0,
            failures: 0,
            errors: 0,
            entries: vec![],
        }
    }

    /// Reads a report from a JUnit XML document.
    ///
    /// Both `<testsuites>` and bare `<testsuite>` roots are accepted. A bare
    /// `<testsuite>` root is wrapped in an unnamed report.
    pub fn deserialize_str(input: &str) -> Result<Self, DeserializeError> {
        deserialize_report(input)
    }

    /// Sets the start timestamp for the report.
    pub fn set_timestamp(&mut self, timestamp: impl Into<DateTime<FixedOffset>>) -> &mut Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Sets the time taken for overall execution.
    pub fn set_time(&mut self, time: Duration) -> &mut Self {
        self.time = Some(time);
        self
    }

    /// Adds a new testsuite and updates the `tests`, `failures` and `errors` counts.
    ///
    /// When generating a new report, use of this method is recommended over adding to
    /// `self.entries` directly.
    pub fn add_test_suite(&mut self, test_suite: TestSuite) -> &mut Self {
        self.tests += test_suite.tests;
        self.failures += test_suite.failures;
        self.errors += test_suite.errors;
        self.entries.push(ReportEntry::TestSuite(test_suite));
        self
    }

    /// Adds several testsuites and updates the `tests`, `failures` and `errors` counts.
    pub fn add_test_suites(
        &mut self,
        test_suites: impl IntoIterator<Item = TestSuite>,
    ) -> &mut Self {
        for test_suite in test_suites {
            self.add_test_suite(test_suite);
        }
        self
    }

    /// Adds a nested report and updates the counts.
    pub fn add_nested_report(&mut self, report: Report) -> &mut Self {
        self.tests += report.tests;
        self.failures += report.failures;
        self.errors += report.errors;
        self.entries.push(ReportEntry::Report(report));
        self
    }

    /// Returns the number of leaf testsuites in this report, after flattening.
    pub fn flat_len(&self) -> usize {
        self.flatten().len()
    }

    /// Returns every testsuite in this report, depth-first and in document order.
    ///
    /// A testsuite that only groups other testsuites (it has nested suites but
    /// no testcases of its own) is a structural node and is not returned;
    /// its children are.
    pub fn flatten(&self) -> Vec<&TestSuite> {
        let mut out = Vec::new();
        for entry in &self.entries {
            match entry {
                ReportEntry::TestSuite(test_suite) => test_suite.flatten_into(&mut out),
                ReportEntry::Report(report) => out.extend(report.flatten()),
            }
        }
        out
    }

    /// Returns a mutable reference to the testsuite at `index` in the order
    /// produced by [`Self::flatten`].
    pub fn flat_test_suite_mut(&mut self, index: usize) -> Option<&mut TestSuite> {
        let mut remaining = index;
        find_in_entries_mut(&mut self.entries, &mut remaining)
    }

    /// Consumes this report, returning its testsuites in the order produced by
    /// [`Self::flatten`], with all nesting removed.
    pub fn into_flat_test_suites(self) -> Vec<TestSuite> {
        let mut out = Vec::new();
        for entry in self.entries {
            match entry {
                ReportEntry::TestSuite(test_suite) => test_suite.into_flat_into(&mut out),
                ReportEntry::Report(report) => out.extend(report.into_flat_test_suites()),
            }
        }
        out
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
            SerializeError::from(quick_xml::Error::NonDecodable(Some(utf8_err.utf8_error())))
        })
    }
}

fn find_in_entries_mut<'a>(
    entries: &'a mut [ReportEntry],
    index: &mut usize,
) -> Option<&'a mut TestSuite> {
    for entry in entries {
        let found = match entry {
            ReportEntry::TestSuite(test_suite) => test_suite.find_flat_mut(index),
            ReportEntry::Report(report) => find_in_entries_mut(&mut report.entries, index),
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

/// Represents a single testsuite.
///
/// A `TestSuite` groups together several `TestCase` instances.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct TestSuite {
    /// The name of this testsuite.
    pub name: String,

    /// The total number of tests in this testsuite.
    pub tests: usize,

    /// The total number of disabled tests in this testsuite.
    pub disabled: usize,

    /// The total number of tests in this suite that errored.
    ///
    /// An "error" is usually some sort of *unexpected* issue in a test.
    pub errors: usize,

    /// The total number of tests in this suite that failed.
    ///
    /// A "failure" is usually some sort of *expected* issue in a test.
    pub failures: usize,

    /// The time at which the testsuite began execution.
    pub timestamp: Option<DateTime<FixedOffset>>,

    /// The overall time taken by the testsuite.
    pub time: Option<Duration>,

    /// The testcases that form this testsuite.
    pub test_cases: Vec<TestCase>,

    /// Custom properties set during test execution, e.g. captured output.
    pub properties: Vec<Property>,

    /// Data written to standard output while the testsuite was executed.
    pub system_out: Option<Output>,

    /// Data written to standard error while the testsuite was executed.
    pub system_err: Option<Output>,

    /// Other fields that may be set as attributes, such as "hostname" or "package".
    pub extra: IndexMap<String, String>,

    /// Testsuites nested inside this one.
    ///
    /// Only populated when reading reports; flattening lifts them out.
    pub test_suites: Vec<TestSuite>,
}

impl TestSuite {
    /// Creates a new `TestSuite`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            time: None,
            timestamp: None,
            tests: 0,
            disabled: 0,
            errors: 0,
            failures: 0,
            test_cases: vec![],
            properties: vec![],
            system_out: None,
            system_err: None,
            extra: IndexMap::new(),
            test_suites: vec![],
        }
    }

    /// Returns the `hostname` attribute, if set.
    pub fn hostname(&self) -> Option<&str> {
        self.extra.get(HOSTNAME_ATTR).map(String::as_str)
    }

    /// Sets the `hostname` attribute.
    pub fn set_hostname(&mut self, hostname: impl Into<String>) -> &mut Self {
        self.extra.insert(HOSTNAME_ATTR.to_owned(), hostname.into());
        self
    }

    /// Sets the start timestamp for the testsuite.
    pub fn set_timestamp(&mut self, timestamp: impl Into<DateTime<FixedOffset>>) -> &mut Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Sets the time taken for the testsuite.
    pub fn set_time(&mut self, time: Duration) -> &mut Self {
        self.time = Some(time);
        self
    }

    /// Adds a property to this testsuite.
    pub fn add_property(&mut self, property: impl Into<Property>) -> &mut Self {
        self.properties.push(property.into());
        self
    }

    /// Returns the value of the first property with the given name.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|property| property.name == name)
            .map(|property| property.value.as_str())
    }

    /// Adds a testcase to this testsuite and updates the counts.
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
            TestCaseStatus::Skipped { .. } => self.disabled += 1,
        }
        self.test_cases.push(test_case);
        self
    }

    pub fn add_test_cases(&mut self, test_cases: impl IntoIterator<Item = TestCase>) -> &mut Self {
        for test_case in test_cases {
            self.add_test_case(test_case);
        }
        self
    }

    /// Adds a nested testsuite.
    pub fn add_nested_test_suite(&mut self, test_suite: TestSuite) -> &mut Self {
        self.test_suites.push(test_suite);
        self
    }

    /// Sets standard output.
    pub fn set_system_out(&mut self, system_out: impl AsRef<str>) -> &mut Self {
        self.system_out = Some(Output::new(system_out.as_ref()));
        self
    }

    /// Sets standard error.
    pub fn set_system_err(&mut self, system_err: impl AsRef<str>) -> &mut Self {
        self.system_err = Some(Output::new(system_err.as_ref()));
        self
    }

    // A suite that only wraps other suites is structure, not a result.
    fn is_leaf(&self) -> bool {
        !self.test_cases.is_empty() || self.test_suites.is_empty()
    }

    fn flatten_into<'a>(&'a self, out: &mut Vec<&'a TestSuite>) {
        if self.is_leaf() {
            out.push(self);
        }
        for nested in &self.test_suites {
            nested.flatten_into(out);
        }
    }

    fn find_flat_mut(&mut self, index: &mut usize) -> Option<&mut TestSuite> {
        if self.is_leaf() {
            if *index == 0 {
                return Some(self);
            }
            *index -= 1;
        }
        for nested in &mut self.test_suites {
            if let Some(found) = nested.find_flat_mut(index) {
                return Some(found);
            }
        }
        None
    }

    fn into_flat_into(mut self, out: &mut Vec<TestSuite>) {
        let nested = mem::take(&mut self.test_suites);
        if !self.test_cases.is_empty() || nested.is_empty() {
            out.push(self);
        }
        for test_suite in nested {
            test_suite.into_flat_into(out);
        }
    }
}

/// Represents a single testcase.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct TestCase {
    /// The name of the testcase.
    pub name: String,

    /// The "classname" of the testcase.
    ///
    /// Typically, this represents the fully qualified path to the test. In other words,
    /// `classname` + `name` together should uniquely identify and locate a test.
    pub classname: Option<String>,

    /// The number of assertions in the testcase.
    pub assertions: Option<usize>,

    /// The time at which this testcase began execution.
    ///
    /// This is not part of the JUnit spec, but may be useful for some tools.
    pub timestamp: Option<DateTime<FixedOffset>>,

    /// The time it took to execute this testcase.
    pub time: Option<Duration>,

    /// The status of this test.
    pub status: TestCaseStatus,

    /// Data written to standard output while the testcase was executed.
    pub system_out: Option<Output>,

    /// Data written to standard error while the testcase was executed.
    pub system_err: Option<Output>,

    /// Other fields that may be set as attributes, such as "file".
    pub extra: IndexMap<String, String>,
}

impl TestCase {
    /// Creates a new testcase.
    pub fn new(name: impl Into<String>, status: TestCaseStatus) -> Self {
        Self {
            name: name.into(),
            classname: None,
            assertions: None,
            timestamp: None,
            time: None,
            status,
            system_out: None,
            system_err: None,
            extra: IndexMap::new(),
        }
    }

    /// Sets the classname of the test.
    pub fn set_classname(&mut self, classname: impl Into<String>) -> &mut Self {
        self.classname = Some(classname.into());
        self
    }

    /// Returns the classname, treating a missing classname as empty.
    pub fn classname_or_empty(&self) -> &str {
        self.classname.as_deref().unwrap_or_default()
    }

    /// Sets the number of assertions in the testcase.
    pub fn set_assertions(&mut self, assertions: usize) -> &mut Self {
        self.assertions = Some(assertions);
        self
    }

    /// Sets the start timestamp for the testcase.
    pub fn set_timestamp(&mut self, timestamp: impl Into<DateTime<FixedOffset>>) -> &mut Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Sets the time taken for the testcase.
    pub fn set_time(&mut self, time: Duration) -> &mut Self {
        self.time = Some(time);
        self
    }

    /// Sets standard output.
    pub fn set_system_out(&mut self, system_out: impl AsRef<str>) -> &mut Self {
        self.system_out = Some(Output::new(system_out.as_ref()));
        self
    }

    /// Sets standard error.
    pub fn set_system_err(&mut self, system_err: impl AsRef<str>) -> &mut Self {
        self.system_err = Some(Output::new(system_err.as_ref()));
        self
    }
}

/// Represents the success or failure of a testcase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TestCaseStatus {
    /// This testcase passed.
    Success,

    /// This testcase did not pass.
    NonSuccess {
        /// Whether this testcase failed in an expected way (failure) or an unexpected way (error).
        kind: NonSuccessKind,

        /// The failure message.
        message: Option<String>,

        /// The "type" of failure that occurred.
        ty: Option<String>,

        /// The description of the failure.
        ///
        /// This is serialized and deserialized from the text node of the element.
        description: Option<String>,
    },

    /// This testcase was not run.
    Skipped {
        /// The skip message.
        message: Option<String>,

        /// The "type" of skip that occurred.
        ty: Option<String>,

        /// The description of the skip.
        ///
        /// This is serialized and deserialized from the text node of the element.
        description: Option<String>,
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
            message: None,
            ty: None,
            description: None,
        }
    }

    /// Creates a new `TestCaseStatus` that represents a skipped test.
    pub fn skipped() -> Self {
        TestCaseStatus::Skipped {
            message: None,
            ty: None,
            description: None,
        }
    }

    /// Returns the message, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            TestCaseStatus::Success => None,
            TestCaseStatus::NonSuccess { message, .. } | TestCaseStatus::Skipped { message, .. } => {
                message.as_deref()
            }
        }
    }

    /// Sets the message. No-op if this is a success case.
    pub fn set_message(&mut self, message: impl Into<String>) -> &mut Self {
        let message_mut = match self {
            TestCaseStatus::Success => return self,
            TestCaseStatus::NonSuccess { message, .. } => message,
            TestCaseStatus::Skipped { message, .. } => message,
        };
        *message_mut = Some(message.into());
        self
    }

    /// Sets the type. No-op if this is a success case.
    pub fn set_type(&mut self, ty: impl Into<String>) -> &mut Self {
        let ty_mut = match self {
            TestCaseStatus::Success => return self,
            TestCaseStatus::NonSuccess { ty, .. } => ty,
            TestCaseStatus::Skipped { ty, .. } => ty,
        };
        *ty_mut = Some(ty.into());
        self
    }

    /// Sets the description (text node). No-op if this is a success case.
    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        let description_mut = match self {
            TestCaseStatus::Success => return self,
            TestCaseStatus::NonSuccess { description, .. } => description,
            TestCaseStatus::Skipped { description, .. } => description,
        };
        *description_mut = Some(description.into());
        self
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NonSuccessKind {
    /// This is an expected failure. Serialized as `failure`.
    Failure,

    /// This is an unexpected error. Serialized as `error`.
    Error,
}

/// Custom properties set during test execution, e.g. environment variables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Property {
    /// The name of the property.
    pub name: String,

    /// The value of the property.
    pub value: String,
}

impl Property {
    /// Creates a new `Property` instance.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl<T> From<(T, T)> for Property
where
    T: Into<String>,
{
    fn from((k, v): (T, T)) -> Self {
        Property::new(k, v)
    }
}

/// Represents text that is written out to standard output or standard error during text execution.
///
/// # Encoding
///
/// On Unix platforms, standard output and standard error are typically bytestrings (`Vec<u8>`).
/// However, XUnit assumes that the output is valid Unicode, and this type definition reflects
/// that.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Output {
    output: Box<str>,
}

impl Output {
    /// Creates a new output, removing any non-printable characters from it.
    pub fn new(output: impl AsRef<str>) -> Self {
        let output = strip_invalid_xml_chars(output.as_ref()).into_boxed_str();
        Self { output }
    }

    /// Returns the output.
    pub fn as_str(&self) -> &str {
        &self.output
    }

    /// Converts the output into a string.
    pub fn into_string(self) -> String {
        self.output.into_string()
    }
}

impl AsRef<str> for Output {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<Output> for String {
    fn from(output: Output) -> Self {
        output.into_string()
    }
}

/// Removes control characters that XML 1.0 cannot represent, even escaped.
pub(crate) fn strip_invalid_xml_chars(input: &str) -> String {
    input.replace(
        |c| matches!(c, '\x00'..='\x08' | '\x0b' | '\x0c' | '\x0e'..='\x1f'),
        "",
    )
}
