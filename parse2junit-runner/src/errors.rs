// Copyright (c) The parse2junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by parse2junit.

use camino::Utf8PathBuf;
use parse2junit_xml::{DeserializeError, SerializeError};
use std::{error, fmt, io};
use thiserror::Error;

/// An error that occurred while parsing a single input file.
///
/// The merger logs these and moves on to the next input.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The input file could not be read.
    #[error("failed to read `{path}`")]
    Read {
        /// The path that was being read.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The input file was not a valid JUnit document.
    #[error("failed to parse JUnit XML at `{path}`")]
    Xml {
        /// The path that was being parsed.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: DeserializeError,
    },
}

/// An error that occurred while writing the merged report.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteReportError {
    /// The report could not be serialized.
    #[error("failed to serialize report")]
    Serialize(#[from] SerializeError),

    /// Writing to standard output failed.
    #[error("failed to write report to standard output")]
    Stdout(#[source] io::Error),

    /// Moving an existing file out of the way failed.
    #[error("failed to back up `{from}` to `{to}`")]
    Backup {
        /// The existing output file.
        from: Utf8PathBuf,

        /// The backup location.
        to: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// Writing the output file failed.
    #[error("failed to write report to `{path}`")]
    Write {
        /// The output file.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },
}

/// An error that occurred while working out the identity of this run.
///
/// These never abort a run: the identity resolver logs them and falls back to
/// a less specific name.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IdentityError {
    /// Running git failed, or git exited with a non-zero status.
    #[error("failed to run `git {args}`")]
    Git {
        /// The arguments passed to git.
        args: String,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The local host name could not be determined.
    #[error("failed to read the local host name: {message}")]
    Hostname {
        /// A description of the failure.
        message: String,
    },

    /// The machine id file could not be read.
    #[error("failed to read machine id from `{path}`")]
    MachineId {
        /// The machine id path.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The machine id file was empty.
    #[error("machine id file `{path}` is empty")]
    EmptyMachineId {
        /// The machine id path.
        path: Utf8PathBuf,
    },
}

/// Displays an error along with every error in its [`source`](error::Error::source) chain.
///
/// ```text
/// failed to parse JUnit XML at `junit_01.xml`
///   caused by:
///   - malformed JUnit XML
///   - ill-formed document: ...
/// ```
pub struct DisplayErrorChain<E> {
    error: E,
}

impl<E: error::Error> DisplayErrorChain<E> {
    /// Wraps an error for display.
    pub fn new(error: E) -> Self {
        Self { error }
    }
}

impl<E: error::Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        let mut source = self.error.source();
        if source.is_some() {
            write!(f, "\n  caused by:")?;
        }
        while let Some(error) = source {
            write!(f, "\n  - {error}")?;
            source = error.source();
        }

        Ok(())
    }
}

impl<E: fmt::Debug> fmt::Debug for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayErrorChain")
            .field("error", &self.error)
            .finish()
    }
}
