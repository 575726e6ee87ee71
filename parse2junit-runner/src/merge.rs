// Copyright (c) The parse2junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merging parsed results into a single report.

use crate::{errors::DisplayErrorChain, identity::RunIdentity, parsers::ParserRegistry};
use camino::Utf8PathBuf;
use parse2junit_xml::Report;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Runs every input through its parser and collects the results into one
/// flat report.
#[derive(Debug)]
pub struct SuiteMerger<'a> {
    registry: &'a ParserRegistry,
    identity: &'a RunIdentity,
}

impl<'a> SuiteMerger<'a> {
    /// Creates a new merger.
    pub fn new(registry: &'a ParserRegistry, identity: &'a RunIdentity) -> Self {
        Self { registry, identity }
    }

    /// Parses `inputs` in order and returns the merged report.
    ///
    /// Inputs that don't exist, that no parser handles, or that fail to parse
    /// are skipped with a warning. The report is named after the run, holds
    /// only flat testsuites in input order, and its time is the sum of the
    /// testsuite times. Testsuites without a hostname get the run's hostname.
    /// The report may be empty; deciding whether that is an error is up to
    /// the caller.
    pub fn merge(&self, inputs: &[Utf8PathBuf]) -> Report {
        let mut report = Report::new(self.identity.results_name());
        let mut time_total = Duration::ZERO;

        for path in inputs {
            if !path.is_file() {
                warn!("{path} doesn't appear to exist, skipping it");
                continue;
            }
            let Some(parser) = self.registry.parser_for(path) else {
                warn!("could not find a parser to handle {path}, skipping it");
                continue;
            };

            info!("parsing {path} using the {} parser", parser.name());
            let results = match parser.parse(path, self.identity.hostname()) {
                Ok(Some(results)) => results,
                Ok(None) => {
                    warn!("no results found in {path}, skipping it");
                    continue;
                }
                Err(error) => {
                    warn!("{}", DisplayErrorChain::new(error));
                    continue;
                }
            };

            for mut test_suite in results.into_flat_test_suites() {
                if test_suite.hostname().is_none_or(str::is_empty) {
                    test_suite.set_hostname(self.identity.hostname());
                }
                debug!(
                    "adding suite {} for {}",
                    test_suite.name,
                    test_suite.hostname().unwrap_or_default(),
                );
                if let Some(time) = test_suite.time {
                    time_total += time;
                }
                report.add_test_suite(test_suite);
            }
        }

        report.set_time(time_total);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::Utf8TempDir;
    use indoc::indoc;
    use parse2junit_xml::ReportEntry;
    use pretty_assertions::assert_eq;
    use std::fs;

    static INTEGRATION_LOG: &str = indoc! {"
        1..2
        ok 1 first test
        not ok 2 second test
    "};

    static E2E_REPORT: &str = indoc! {r#"
        <?xml version="1.0" encoding="UTF-8"?>
        <testsuites>
            <testsuite name="Kubernetes e2e suite" time="12.5">
                <testcase name="[sig-node] pods" classname="Kubernetes e2e suite" time="12.5"/>
            </testsuite>
        </testsuites>
    "#};

    fn identity() -> RunIdentity {
        RunIdentity::new("CRI-O Pull Request 42", "builder-1")
    }

    #[test]
    fn integration_and_e2e() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        let integration = dir.path().join("testout.txt");
        let e2e = dir.path().join("junit_01.xml");
        fs::write(&integration, INTEGRATION_LOG).expect("wrote log");
        fs::write(&e2e, E2E_REPORT).expect("wrote report");

        let registry = ParserRegistry::default();
        let identity = identity();
        let report = SuiteMerger::new(&registry, &identity).merge(&[integration, e2e]);

        assert_eq!(report.name, "CRI-O Pull Request 42");
        assert_eq!(report.time, Some(Duration::from_millis(12_500)));
        assert_eq!((report.tests, report.failures, report.errors), (3, 1, 0));

        let names: Vec<_> = report
            .entries
            .iter()
            .map(|entry| match entry {
                ReportEntry::TestSuite(test_suite) => test_suite.name.as_str(),
                ReportEntry::Report(_) => panic!("merged report is flat"),
            })
            .collect();
        assert_eq!(names, ["CRI-O Integration suite", "Kubernetes e2e suite"]);

        for test_suite in report.flatten() {
            assert_eq!(test_suite.hostname(), Some("builder-1"));
        }
    }

    #[test]
    fn input_order_is_preserved() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        let e2e = dir.path().join("junit_01.xml");
        let integration = dir.path().join("testout.txt");
        fs::write(&integration, INTEGRATION_LOG).expect("wrote log");
        fs::write(&e2e, E2E_REPORT).expect("wrote report");

        let registry = ParserRegistry::default();
        let identity = identity();
        let report = SuiteMerger::new(&registry, &identity).merge(&[e2e, integration]);

        let names: Vec<_> = report.flatten().iter().map(|s| s.name.clone()).collect();
        assert_eq!(names, ["Kubernetes e2e suite", "CRI-O Integration suite"]);
    }

    #[test]
    fn nested_e2e_report_is_flattened() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        let e2e = dir.path().join("junit_02.xml");
        fs::write(
            &e2e,
            indoc! {r#"
                <testsuites name="outer">
                    <testsuites name="inner">
                        <testsuite name="conformance" time="1">
                            <testcase name="a" classname="conformance"/>
                        </testsuite>
                        <testsuite name="Kubernetes e2e suite" time="2">
                            <testcase name="b" classname="Kubernetes e2e suite"/>
                        </testsuite>
                    </testsuites>
                </testsuites>
            "#},
        )
        .expect("wrote report");

        let registry = ParserRegistry::default();
        let identity = identity();
        let report = SuiteMerger::new(&registry, &identity).merge(&[e2e]);

        // The whole document is kept, not just the e2e suite.
        assert_eq!(report.entries.len(), 2);
        assert!(report
            .entries
            .iter()
            .all(|entry| matches!(entry, ReportEntry::TestSuite(_))));
        assert_eq!(report.time, Some(Duration::from_secs(3)));
    }

    #[test]
    fn sibling_suites_get_the_run_hostname() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        let e2e = dir.path().join("junit_01.xml");
        fs::write(
            &e2e,
            indoc! {r#"
                <testsuites>
                    <testsuite>
                        <testcase name="u" classname="pkg"/>
                    </testsuite>
                    <testsuite name="other" hostname="node-7">
                        <testcase name="v" classname="pkg"/>
                    </testsuite>
                    <testsuite name="Kubernetes e2e suite" time="4">
                        <testcase name="w" classname="Kubernetes e2e suite"/>
                    </testsuite>
                </testsuites>
            "#},
        )
        .expect("wrote report");

        let registry = ParserRegistry::default();
        let identity = identity();
        let report = SuiteMerger::new(&registry, &identity).merge(&[e2e]);

        let suites: Vec<_> = report
            .flatten()
            .iter()
            .map(|s| (s.name.as_str(), s.hostname()))
            .collect();
        assert_eq!(
            suites,
            [
                ("", Some("builder-1")),
                ("other", Some("node-7")),
                ("Kubernetes e2e suite", Some("builder-1")),
            ]
        );
    }

    #[test]
    fn unusable_inputs_are_skipped() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        let missing = dir.path().join("testout.txt");
        let unknown = dir.path().join("results.xml");
        let empty_log = dir.path().join("run/testout.txt");
        let malformed = dir.path().join("junit_03.xml");
        fs::write(&unknown, E2E_REPORT).expect("wrote report");
        fs::create_dir(dir.path().join("run")).expect("created dir");
        fs::write(&empty_log, "no header here\n").expect("wrote log");
        fs::write(&malformed, "<testsuites>").expect("wrote report");

        let registry = ParserRegistry::default();
        let identity = identity();
        let report = SuiteMerger::new(&registry, &identity).merge(&[
            missing,
            unknown,
            empty_log,
            malformed,
            dir.path().to_owned(),
        ]);

        assert!(report.entries.is_empty());
        assert_eq!(report.time, Some(Duration::ZERO));
    }
}
