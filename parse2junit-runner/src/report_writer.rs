// Copyright (c) The parse2junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Writing the merged report out.

use crate::errors::WriteReportError;
use atomicwrites::{AtomicFile, OverwriteBehavior};
use camino::{Utf8Path, Utf8PathBuf};
use parse2junit_xml::Report;
use std::{
    convert::Infallible,
    fmt, fs,
    io::{self, Write},
    str::FromStr,
};
use tracing::{info, warn};

/// Where the report is written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputDestination {
    /// Standard output, requested with `-`.
    Stdout,

    /// A file.
    File(Utf8PathBuf),
}

impl FromStr for OutputDestination {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "-" {
            Ok(Self::Stdout)
        } else {
            Ok(Self::File(s.into()))
        }
    }
}

impl fmt::Display for OutputDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("-"),
            Self::File(path) => write!(f, "{path}"),
        }
    }
}

/// What to do when the output file is also one of the inputs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Rename the existing file to `original_<name>` before writing.
    Backup,

    /// Warn, then overwrite it.
    Overwrite,
}

/// What happened to an existing output file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Collision {
    /// The output path wasn't one of the inputs.
    None,

    /// The existing file was moved to `backup`.
    BackedUp {
        /// Where the existing file now lives.
        backup: Utf8PathBuf,
    },

    /// The existing file was overwritten.
    Overwritten,
}

/// Writes a report to its destination.
#[derive(Clone, Debug)]
pub struct ReportWriter {
    destination: OutputDestination,
    policy: CollisionPolicy,
}

impl ReportWriter {
    /// Creates a new writer.
    pub fn new(destination: OutputDestination, policy: CollisionPolicy) -> Self {
        Self {
            destination,
            policy,
        }
    }

    /// Returns the destination.
    pub fn destination(&self) -> &OutputDestination {
        &self.destination
    }

    /// Writes `report`.
    ///
    /// `inputs` are the files the report was built from; if the destination
    /// is one of them, the collision policy applies. `stdout` is only used
    /// when the destination is [`OutputDestination::Stdout`].
    pub fn write(
        &self,
        report: &Report,
        inputs: &[Utf8PathBuf],
        stdout: &mut dyn Write,
    ) -> Result<Collision, WriteReportError> {
        let mut buf = Vec::new();
        report.serialize(&mut buf)?;

        match &self.destination {
            OutputDestination::Stdout => {
                stdout
                    .write_all(&buf)
                    .and_then(|()| stdout.flush())
                    .map_err(WriteReportError::Stdout)?;
                Ok(Collision::None)
            }
            OutputDestination::File(path) => {
                let collision = self.resolve_collision(path, inputs)?;
                info!("writing {path}");
                write_atomic(path, &buf)?;
                Ok(collision)
            }
        }
    }

    fn resolve_collision(
        &self,
        path: &Utf8Path,
        inputs: &[Utf8PathBuf],
    ) -> Result<Collision, WriteReportError> {
        if !path.is_file() || !inputs.iter().any(|input| is_same_file(input, path)) {
            return Ok(Collision::None);
        }

        match self.policy {
            CollisionPolicy::Overwrite => {
                warn!("{path} will be combined with other input files");
                Ok(Collision::Overwritten)
            }
            CollisionPolicy::Backup => {
                let backup = backup_path(path);
                fs::rename(path, &backup).map_err(|error| WriteReportError::Backup {
                    from: path.to_owned(),
                    to: backup.clone(),
                    error,
                })?;
                info!("backed up {path} to {backup}");
                Ok(Collision::BackedUp { backup })
            }
        }
    }
}

/// Returns `original_<name>` in the same directory as `path`.
pub fn backup_path(path: &Utf8Path) -> Utf8PathBuf {
    let file_name = path.file_name().unwrap_or(path.as_str());
    path.with_file_name(format!("original_{file_name}"))
}

fn is_same_file(a: &Utf8Path, b: &Utf8Path) -> bool {
    match (a.canonicalize_utf8(), b.canonicalize_utf8()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn write_atomic(path: &Utf8Path, contents: &[u8]) -> Result<(), WriteReportError> {
    // A bare file name has an empty parent, which the temporary file can't be
    // created in.
    let path = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => path.to_owned(),
        _ => Utf8Path::new(".").join(path),
    };

    let file = AtomicFile::new(&path, OverwriteBehavior::AllowOverwrite);
    file.write(|f| f.write_all(contents))
        .map_err(|error| WriteReportError::Write {
            path: path.clone(),
            error: match error {
                atomicwrites::Error::Internal(error) | atomicwrites::Error::User(error) => error,
            },
        })
}
