// Copyright (c) The parse2junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8PathBuf;
use camino_tempfile::Utf8TempDir;
use clap::Parser;
use indoc::indoc;
use parse2junit::{ExpectedError, OutputWriter, Parse2JunitApp, Parse2JunitExitCode};
use parse2junit_xml::{Report, TestCaseStatus};
use pretty_assertions::assert_eq;
use std::{fs, time::Duration};

static INTEGRATION_LOG: &str = indoc! {"
    1..3
    ok 1 ctr create
    ok 2 # skip (no seccomp) ctr seccomp
    not ok 3 ctr remove
    # (in test file test/ctr.bats, line 42)
"};

static E2E_REPORT: &str = indoc! {r#"
    <?xml version="1.0" encoding="UTF-8"?>
    <testsuites>
        <testsuite tests="2" failures="0" time="75.25">
            <testcase name="[sig-node] Pods should be submitted" classname="Kubernetes e2e suite" time="10"/>
            <testcase name="[sig-storage] ConfigMap should be consumable" classname="Kubernetes e2e suite" time="65.25"/>
        </testsuite>
    </testsuites>
"#};

struct Fixture {
    dir: Utf8TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = Utf8TempDir::new().expect("created temp dir");
        fs::write(dir.path().join("testout.txt"), INTEGRATION_LOG).expect("wrote log");
        fs::write(dir.path().join("junit_01.xml"), E2E_REPORT).expect("wrote report");
        Self { dir }
    }

    fn path(&self, name: &str) -> Utf8PathBuf {
        self.dir.path().join(name)
    }

    fn app(&self, args: &[&str]) -> Parse2JunitApp {
        let mut full_args = vec![
            "parse2junit",
            "--fqdn",
            "builder-1",
            "--repo-dir",
            self.dir.path().as_str(),
        ];
        full_args.extend_from_slice(args);
        Parse2JunitApp::try_parse_from(full_args).expect("arguments parse")
    }
}

#[test]
fn merge_to_stdout() {
    let fixture = Fixture::new();
    let integration = fixture.path("testout.txt");
    let e2e = fixture.path("junit_01.xml");
    let app = fixture.app(&[integration.as_str(), e2e.as_str(), "-"]);

    let mut output = OutputWriter::Test { stdout: Vec::new() };
    let code = app.exec(&mut output).expect("run succeeds");
    assert_eq!(code, Parse2JunitExitCode::OK);

    let stdout = output.captured_stdout().expect("output was captured");
    let xml = std::str::from_utf8(stdout).expect("output is UTF-8");
    let report = Report::deserialize_str(xml).expect("output parses");

    assert!(report.name.starts_with("CRI-O "), "{}", report.name);
    assert_eq!(report.time, Some(Duration::from_millis(75_250)));
    assert_eq!((report.tests, report.failures, report.errors), (5, 1, 0));

    let suites = report.flatten();
    assert_eq!(suites.len(), 2);

    let integration = suites[0];
    assert_eq!(integration.name, "CRI-O Integration suite");
    assert_eq!(integration.hostname(), Some("builder-1"));
    assert_eq!(integration.disabled, 1);
    assert_eq!(
        integration.property("stdout"),
        Some(INTEGRATION_LOG.trim_end())
    );
    let names: Vec<_> = integration
        .test_cases
        .iter()
        .map(|case| case.name.as_str())
        .collect();
    assert_eq!(
        names,
        [
            "[CRI-O] [integration] #1 ctr create",
            "[CRI-O] [integration] #2 ctr seccomp",
            "[CRI-O] [integration] #3 ctr remove",
        ]
    );
    assert!(matches!(
        integration.test_cases[1].status,
        TestCaseStatus::Skipped { .. }
    ));

    let e2e = suites[1];
    assert_eq!(e2e.name, "Kubernetes e2e suite");
    assert_eq!(e2e.hostname(), Some("builder-1"));
    assert_eq!(e2e.time, Some(Duration::from_millis(75_250)));
    assert_eq!(e2e.test_cases.len(), 2);
}

#[test]
fn backup_colliding_output() {
    let fixture = Fixture::new();
    let integration = fixture.path("testout.txt");
    let e2e = fixture.path("junit_01.xml");
    let app = fixture.app(&["--backup", integration.as_str(), e2e.as_str(), e2e.as_str()]);

    let mut output = OutputWriter::Test { stdout: Vec::new() };
    app.exec(&mut output).expect("run succeeds");
    assert_eq!(output.captured_stdout(), Some(&[][..]));

    assert_eq!(
        fs::read_to_string(fixture.path("original_junit_01.xml")).expect("backup exists"),
        E2E_REPORT
    );
    let merged = fs::read_to_string(&e2e).expect("output exists");
    let report = Report::deserialize_str(&merged).expect("output parses");
    assert_eq!(report.flat_len(), 2);
}

#[test]
fn no_suites_produced() {
    let fixture = Fixture::new();
    let empty_log = fixture.path("empty/testout.txt");
    fs::create_dir(fixture.path("empty")).expect("created dir");
    fs::write(&empty_log, "no tests ran\n").expect("wrote log");
    let output_path = fixture.path("results.xml");
    let app = fixture.app(&[
        empty_log.as_str(),
        fixture.path("missing/junit_02.xml").as_str(),
        output_path.as_str(),
    ]);

    let error = app
        .exec(&mut OutputWriter::Test { stdout: Vec::new() })
        .expect_err("nothing to write");
    assert!(matches!(error, ExpectedError::NoSuitesProduced { .. }));
    assert_eq!(error.process_exit_code(), Parse2JunitExitCode::NO_SUITES_PRODUCED);
    assert!(!output_path.exists());
}

#[test]
fn unwritable_output() {
    let fixture = Fixture::new();
    let integration = fixture.path("testout.txt");
    let output_path = fixture.path("missing-dir/results.xml");
    let app = fixture.app(&[integration.as_str(), output_path.as_str()]);

    let error = app
        .exec(&mut OutputWriter::Test { stdout: Vec::new() })
        .expect_err("output directory is missing");
    assert_eq!(error.process_exit_code(), Parse2JunitExitCode::WRITE_OUTPUT_ERROR);
}
