// Copyright (c) The parse2junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{ParsedResults, ResultParser};
use crate::{
    errors::ParseError,
    line_matcher::{self, ResultLine, ResultStatus},
};
use camino::Utf8Path;
use parse2junit_xml::{NonSuccessKind, Property, TestCase, TestCaseStatus, TestSuite};
use std::{fs, time::Duration};
use tracing::debug;

static SUITE_NAME: &str = "CRI-O Integration suite";
static CLASSNAME: &str = "CRI-O integration suite";
static STDOUT_PROPERTY: &str = "stdout";

/// Parses the TAP-like log written by the integration test run.
#[derive(Copy, Clone, Debug, Default)]
pub struct IntegrationParser;

impl ResultParser for IntegrationParser {
    fn name(&self) -> &'static str {
        "integration"
    }

    fn parse(
        &self,
        path: &Utf8Path,
        hostname: &str,
    ) -> Result<Option<ParsedResults>, ParseError> {
        let bytes = fs::read(path).map_err(|error| ParseError::Read {
            path: path.to_owned(),
            error,
        })?;
        let contents = String::from_utf8_lossy(&bytes);
        Ok(parse_integration_log(&contents, hostname).map(ParsedResults::Suite))
    }
}

/// Builds a suite out of the contents of an integration log.
///
/// Returns `None` if the log has no count header, or the header announces no
/// tests. Lines before the header are kept in the `stdout` property but never
/// become testcases.
pub fn parse_integration_log(contents: &str, hostname: &str) -> Option<TestSuite> {
    let mut lines = contents.lines().map(str::trim);
    let mut stdout = Vec::new();

    let mut declared = -1;
    for line in lines.by_ref() {
        stdout.push(line);
        if let Some(header) = line_matcher::count_header(line) {
            declared = header.declared_count();
            break;
        }
    }

    if declared <= 0 {
        debug!("no tests announced in integration log (declared count {declared})");
        return None;
    }

    let mut test_suite = TestSuite::new(SUITE_NAME);
    test_suite
        .set_hostname(hostname)
        .set_time(Duration::ZERO);

    for line in lines {
        stdout.push(line);
        if let Some(result) = line_matcher::result_line(line) {
            test_suite.add_test_case(test_case_for(&result));
        }
    }

    if i64::try_from(test_suite.tests) != Ok(declared) {
        debug!(
            "integration log announced {declared} tests but {} were found",
            test_suite.tests,
        );
    }

    test_suite.add_property(Property::new(STDOUT_PROPERTY, stdout.join("\n")));
    Some(test_suite)
}

fn test_case_for(result: &ResultLine<'_>) -> TestCase {
    let status = match (result.skip_reason, result.status) {
        (Some(reason), _) => {
            let mut status = TestCaseStatus::skipped();
            status.set_message(reason);
            status
        }
        (None, ResultStatus::Ok) => TestCaseStatus::success(),
        (None, ResultStatus::NotOk) => {
            let mut status = TestCaseStatus::non_success(NonSuccessKind::Failure);
            status.set_message(ResultStatus::NotOk.as_str());
            status
        }
    };

    let name = format!(
        "[CRI-O] [integration] #{} {}",
        result.number, result.description
    );
    let mut test_case = TestCase::new(name, status);
    test_case
        .set_classname(CLASSNAME)
        .set_system_err(result.status.as_str());
    test_case
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::Utf8TempDir;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn pass_and_fail() {
        let log = indoc! {"
            1..2
            ok 1 first test
            not ok 2 second test
        "};
        let suite = parse_integration_log(log, "builder-1").expect("suite is produced");

        assert_eq!(suite.name, "CRI-O Integration suite");
        assert_eq!(suite.hostname(), Some("builder-1"));
        assert_eq!(suite.time, Some(Duration::ZERO));
        assert_eq!((suite.tests, suite.failures, suite.errors), (2, 1, 0));

        let names: Vec<_> = suite.test_cases.iter().map(|case| case.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "[CRI-O] [integration] #1 first test",
                "[CRI-O] [integration] #2 second test",
            ]
        );
        for case in &suite.test_cases {
            assert_eq!(case.classname.as_deref(), Some("CRI-O integration suite"));
        }

        assert_eq!(suite.test_cases[0].status, TestCaseStatus::success());
        let mut failed = TestCaseStatus::non_success(NonSuccessKind::Failure);
        failed.set_message("not ok");
        assert_eq!(suite.test_cases[1].status, failed);
        assert_eq!(
            suite.test_cases[1].system_err.as_ref().map(|out| out.as_str()),
            Some("not ok")
        );

        assert_eq!(
            suite.property("stdout"),
            Some("1..2\nok 1 first test\nnot ok 2 second test")
        );
    }

    #[test]
    fn skip_lines_are_skipped_cases() {
        let log = indoc! {"
            1..2
            ok 1 # skip (requires root) userns test
            ok 2 plain test
        "};
        let suite = parse_integration_log(log, "host").expect("suite is produced");

        assert_eq!((suite.tests, suite.disabled, suite.failures), (2, 1, 0));
        let skipped = &suite.test_cases[0];
        assert_eq!(skipped.name, "[CRI-O] [integration] #1 userns test");
        assert_eq!(skipped.status.message(), Some("(requires root)"));
        assert!(matches!(skipped.status, TestCaseStatus::Skipped { .. }));
        assert_eq!(
            skipped.system_err.as_ref().map(|out| out.as_str()),
            Some("ok")
        );
    }

    #[test]
    fn lines_are_trimmed_and_noise_is_kept() {
        let log = "preamble\n  1..1  \n# setup\n   ok 1 indented test   \n";
        let suite = parse_integration_log(log, "host").expect("suite is produced");

        assert_eq!(suite.tests, 1);
        assert_eq!(suite.test_cases[0].name, "[CRI-O] [integration] #1 indented test");
        assert_eq!(
            suite.property("stdout"),
            Some("preamble\n1..1\n# setup\nok 1 indented test")
        );
    }

    #[test]
    fn result_lines_before_header_are_ignored() {
        let log = indoc! {"
            ok 7 stray result
            1..1
            ok 1 real result
        "};
        let suite = parse_integration_log(log, "host").expect("suite is produced");
        assert_eq!(suite.tests, 1);
        assert_eq!(suite.test_cases[0].name, "[CRI-O] [integration] #1 real result");
    }

    #[test]
    fn mismatched_count_keeps_parsed_cases() {
        let log = indoc! {"
            1..5
            ok 1 only test
        "};
        let suite = parse_integration_log(log, "host").expect("suite is produced");
        assert_eq!(suite.tests, 1);
    }

    #[test]
    fn oversized_header_still_produces_a_suite() {
        let suite = parse_integration_log("1..99999999999999999999\nok 1 a\n", "host")
            .expect("suite is produced");
        assert_eq!(suite.tests, 1);
        assert_eq!(suite.test_cases[0].name, "[CRI-O] [integration] #1 a");
    }

    #[test]
    fn no_suite_without_tests() {
        assert_eq!(parse_integration_log("ok 1 no header\n", "host"), None);
        assert_eq!(parse_integration_log("", "host"), None);
        assert_eq!(parse_integration_log("3..1\nok 1 reversed\n", "host"), None);
        // 2..1 announces zero tests.
        assert_eq!(parse_integration_log("2..1\n", "host"), None);
    }

    #[test]
    fn parse_reads_lossy_utf8() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        let path = dir.path().join("testout.txt");
        fs::write(&path, b"1..1\nok 1 caf\xe9 test\n").expect("wrote log");

        let results = IntegrationParser
            .parse(&path, "host")
            .expect("file is readable")
            .expect("suite is produced");
        let suites = results.into_flat_test_suites();
        assert_eq!(suites.len(), 1);
        assert_eq!(
            suites[0].test_cases[0].name,
            "[CRI-O] [integration] #1 caf\u{FFFD} test"
        );
    }

    #[test]
    fn parse_missing_file_is_an_error() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        let error = IntegrationParser
            .parse(&dir.path().join("testout.txt"), "host")
            .expect_err("file is missing");
        assert!(matches!(error, ParseError::Read { .. }));
    }
}
