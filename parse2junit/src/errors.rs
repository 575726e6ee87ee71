// Copyright (c) The parse2junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{Parse2JunitExitCode, StderrStyles, output::NO_HEADING_TARGET};
use camino::Utf8PathBuf;
use owo_colors::OwoColorize;
use parse2junit_runner::errors::WriteReportError;
use std::error::Error;
use thiserror::Error;
use tracing::{error, info};

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An expected failure: something went wrong with the inputs or the
/// environment, not with parse2junit itself.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    /// None of the inputs produced a test suite.
    #[error("no test suites were produced")]
    NoSuitesProduced {
        /// The inputs that were processed.
        inputs: Vec<Utf8PathBuf>,
    },

    /// The merged report could not be written.
    #[error("failed to write report")]
    WriteReport {
        /// The underlying error.
        #[from]
        err: WriteReportError,
    },
}

impl ExpectedError {
    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::NoSuitesProduced { .. } => Parse2JunitExitCode::NO_SUITES_PRODUCED,
            Self::WriteReport { .. } => Parse2JunitExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match self {
            Self::NoSuitesProduced { inputs } => {
                error!("no test suites were produced, not writing a report");
                let inputs: Vec<_> = inputs.iter().map(|input| input.as_str()).collect();
                info!(
                    target: NO_HEADING_TARGET,
                    "(inputs: {})",
                    inputs.join(", ").style(styles.bold),
                );
                None
            }
            Self::WriteReport { err } => {
                error!("{err}");
                err.source()
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
