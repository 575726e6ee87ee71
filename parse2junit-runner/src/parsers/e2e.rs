// Copyright (c) The parse2junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{ParsedResults, ResultParser};
use crate::errors::ParseError;
use camino::Utf8Path;
use parse2junit_xml::{Report, TestSuite};
use std::{fs, time::Duration};
use tracing::debug;

static E2E_MARKER: &str = "Kubernetes e2e";
static DEFAULT_NAME: &str = "Kubernetes e2e suite";

/// Parses a JUnit report written by the Kubernetes e2e test run.
///
/// The report is returned with its original structure. Only the e2e suite in
/// it is touched: missing names, hostnames and classnames are filled in.
#[derive(Copy, Clone, Debug, Default)]
pub struct E2eParser;

impl ResultParser for E2eParser {
    fn name(&self) -> &'static str {
        "e2e"
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
        let mut report =
            Report::deserialize_str(&contents).map_err(|error| ParseError::Xml {
                path: path.to_owned(),
                error,
            })?;

        let Some(index) = find_e2e_suite(&report) else {
            debug!("no e2e results found in {path}");
            return Ok(None);
        };
        let Some(suite) = report.flat_test_suite_mut(index) else {
            return Ok(None);
        };

        backfill(suite, hostname);
        if suite.time.is_none_or(|time| time.is_zero()) {
            match file_duration(path) {
                Some(duration) => {
                    suite.set_time(duration);
                }
                None => debug!("no usable timing metadata for {path}"),
            }
        }
        debug!("parsed {} e2e test cases from {path}", suite.tests);

        Ok(Some(ParsedResults::Report(report)))
    }
}

/// Returns the flattened index of the e2e suite in `report`.
///
/// A suite qualifies if its name mentions Kubernetes e2e, or if every one of
/// its testcases has a classname that does. Suites are checked in the order
/// produced by [`Report::flatten`].
pub fn find_e2e_suite(report: &Report) -> Option<usize> {
    report.flatten().into_iter().position(is_e2e_suite)
}

fn is_e2e_suite(suite: &TestSuite) -> bool {
    suite.name.contains(E2E_MARKER)
        || suite
            .test_cases
            .iter()
            .all(|case| case.classname_or_empty().trim().contains(E2E_MARKER))
}

/// Fills in a missing hostname, suite name and testcase classnames.
pub fn backfill(suite: &mut TestSuite, hostname: &str) {
    if suite.hostname().is_none_or(str::is_empty) {
        suite.set_hostname(hostname);
    }
    if suite.name.is_empty() {
        suite.name = DEFAULT_NAME.to_owned();
    }
    for case in &mut suite.test_cases {
        if case.classname_or_empty().is_empty() {
            debug!("adding missing classname to testcase {}", case.name);
            case.set_classname(DEFAULT_NAME);
        }
    }
}

// The report doesn't say how long the run took, so approximate it from when
// the file was first and last written.
fn file_duration(path: &Utf8Path) -> Option<Duration> {
    let metadata = fs::metadata(path).ok()?;
    let duration = metadata_duration(&metadata)?;
    (!duration.is_zero()).then_some(duration)
}

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        fn metadata_duration(metadata: &fs::Metadata) -> Option<Duration> {
            use std::os::unix::fs::MetadataExt;

            let changed = Duration::new(
                u64::try_from(metadata.ctime()).ok()?,
                u32::try_from(metadata.ctime_nsec()).ok()?,
            );
            let modified = Duration::new(
                u64::try_from(metadata.mtime()).ok()?,
                u32::try_from(metadata.mtime_nsec()).ok()?,
            );
            modified.checked_sub(changed)
        }
    } else {
        fn metadata_duration(metadata: &fs::Metadata) -> Option<Duration> {
            let created = metadata.created().ok()?;
            let modified = metadata.modified().ok()?;
            modified.duration_since(created).ok()
        }
    }
}
