// Copyright (c) The parse2junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError, OutputWriter, Parse2JunitExitCode,
    output::{OutputContext, OutputOpts, clap_styles},
};
use camino::Utf8PathBuf;
use clap::Parser;
use parse2junit_runner::{
    identity::{GitCli, HostnameResolver, ResultsNameResolver, RunIdentity},
    merge::SuiteMerger,
    parsers::ParserRegistry,
    report_writer::{CollisionPolicy, OutputDestination, ReportWriter},
};
use tracing::info;

/// Convert CI test results into a single JUnit report.
///
/// Integration logs (`testout.txt`) and Kubernetes e2e reports
/// (`junit_NN.xml`) are parsed, and every test suite found is written to one
/// flat JUnit XML report.
#[derive(Debug, Parser)]
#[command(version, styles = clap_styles::style())]
pub struct Parse2JunitApp {
    /// Hostname to record on suites that don't have one [default: this host]
    #[arg(long, short, value_name = "HOSTNAME", env = "PARSE2JUNIT_FQDN")]
    fqdn: Option<String>,

    /// If the output file is also an input file, back it up with an `original_` prefix
    #[arg(long, short)]
    backup: bool,

    /// Git repository used to name the run [default: current directory]
    #[arg(long, value_name = "DIR", env = "PARSE2JUNIT_REPO_DIR")]
    repo_dir: Option<Utf8PathBuf>,

    #[command(flatten)]
    output: OutputOpts,

    /// Input files: integration logs and e2e JUnit reports
    #[arg(value_name = "INPUTS", required = true, num_args = 1..)]
    inputs: Vec<Utf8PathBuf>,

    /// Output file for the JUnit report, or `-` for standard output
    #[arg(value_name = "OUTPUT")]
    output_path: OutputDestination,
}

impl Parse2JunitApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app.
    pub fn exec(self, output_writer: &mut OutputWriter) -> Result<i32, ExpectedError> {
        let identity = self.resolve_identity();
        info!(
            "using results name {} and hostname {}",
            identity.results_name(),
            identity.hostname(),
        );

        let registry = ParserRegistry::default();
        let report = SuiteMerger::new(&registry, &identity).merge(&self.inputs);
        if report.entries.is_empty() {
            return Err(ExpectedError::NoSuitesProduced {
                inputs: self.inputs,
            });
        }
        info!("parsed {} suites", report.entries.len());

        let policy = if self.backup {
            CollisionPolicy::Backup
        } else {
            CollisionPolicy::Overwrite
        };
        let writer = ReportWriter::new(self.output_path, policy);
        writer.write(&report, &self.inputs, &mut output_writer.stdout_writer())?;

        Ok(Parse2JunitExitCode::OK)
    }

    fn resolve_identity(&self) -> RunIdentity {
        let hostname = match &self.fqdn {
            Some(fqdn) => fqdn.clone(),
            None => HostnameResolver::default().resolve(),
        };
        let repo_dir = self
            .repo_dir
            .clone()
            .unwrap_or_else(|| Utf8PathBuf::from("."));
        let results_name = ResultsNameResolver::new(GitCli::new(repo_dir)).resolve();

        RunIdentity::new(results_name, hostname)
    }
}
