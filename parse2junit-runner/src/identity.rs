// Copyright (c) The parse2junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Working out what this run is called and which host it ran on.
//!
//! Both are best effort. Every lookup has a fallback, ending in a random UUID,
//! so resolving an identity never fails.

use crate::errors::{DisplayErrorChain, IdentityError};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tracing::debug;
use uuid::Uuid;

/// Substrings of CI host names that are shared between unrelated machines.
static EPHEMERAL_HOST_MARKERS: &[&str] = &["openshiftdevel", "ip-"];

static DEFAULT_MACHINE_ID_PATH: &str = "/etc/machine-id";

static PULL_REQUEST_REFS: &str = "refs/pull/[0-9]*/head";

/// The name and host stamped on a merged report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunIdentity {
    results_name: String,
    hostname: String,
}

impl RunIdentity {
    /// Creates a new identity.
    pub fn new(results_name: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            results_name: results_name.into(),
            hostname: hostname.into(),
        }
    }

    /// The name of the run, used as the report name.
    pub fn results_name(&self) -> &str {
        &self.results_name
    }

    /// The host name given to suites that don't carry their own.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }
}

/// Works out a host name that identifies the machine the tests ran on.
#[derive(Clone, Debug)]
pub struct HostnameResolver {
    machine_id_path: Utf8PathBuf,
}

impl HostnameResolver {
    /// Creates a resolver that reads the machine id from `machine_id_path`.
    pub fn with_machine_id_path(machine_id_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            machine_id_path: machine_id_path.into(),
        }
    }

    /// Returns the local host name, or a machine id or random id if the host
    /// name doesn't tell CI machines apart.
    pub fn resolve(&self) -> String {
        match local_hostname() {
            Ok(hostname) => self.resolve_from(&hostname),
            Err(error) => {
                debug!("{}", DisplayErrorChain::new(error));
                self.unique_id()
            }
        }
    }

    /// Like [`Self::resolve`], with the local host name supplied by the caller.
    pub fn resolve_from(&self, local_hostname: &str) -> String {
        if is_ephemeral(local_hostname) {
            debug!("host name {local_hostname} is not distinctive, using a unique id");
            self.unique_id()
        } else {
            local_hostname.to_owned()
        }
    }

    fn unique_id(&self) -> String {
        match self.machine_id() {
            Ok(machine_id) => format!("machine-id-{machine_id}"),
            Err(error) => {
                debug!("{}", DisplayErrorChain::new(error));
                format!("uuid-{}", Uuid::new_v4())
            }
        }
    }

    fn machine_id(&self) -> Result<String, IdentityError> {
        let contents =
            fs::read_to_string(&self.machine_id_path).map_err(|error| IdentityError::MachineId {
                path: self.machine_id_path.clone(),
                error,
            })?;
        let machine_id = contents.trim();
        if machine_id.is_empty() {
            return Err(IdentityError::EmptyMachineId {
                path: self.machine_id_path.clone(),
            });
        }
        Ok(machine_id.to_owned())
    }
}

impl Default for HostnameResolver {
    fn default() -> Self {
        Self::with_machine_id_path(DEFAULT_MACHINE_ID_PATH)
    }
}

fn local_hostname() -> Result<String, IdentityError> {
    whoami::hostname().map_err(|error| IdentityError::Hostname {
        message: error.to_string(),
    })
}

fn is_ephemeral(hostname: &str) -> bool {
    EPHEMERAL_HOST_MARKERS
        .iter()
        .any(|marker| hostname.contains(marker))
}

/// Where revision information for a run comes from.
pub trait RevisionSource {
    /// Returns the full commit id checked out for this run.
    fn head_commit(&self) -> Result<String, IdentityError>;

    /// Returns the remote's pull request heads, one `<commit>\t<ref>` per line.
    fn pull_request_heads(&self) -> Result<String, IdentityError>;
}

/// Reads revision information by running `git`.
#[derive(Clone, Debug)]
pub struct GitCli {
    repo_dir: Utf8PathBuf,
}

impl GitCli {
    /// Creates a new `GitCli` that runs in `repo_dir`.
    pub fn new(repo_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
        }
    }

    /// The directory git is run in.
    pub fn repo_dir(&self) -> &Utf8Path {
        &self.repo_dir
    }

    fn run(&self, args: &[&str]) -> Result<String, IdentityError> {
        // Captured so that git's complaints don't end up mixed into our own
        // diagnostics.
        duct::cmd("git", args.iter().copied())
            .dir(self.repo_dir.as_std_path())
            .stdout_capture()
            .stderr_capture()
            .read()
            .map_err(|error| IdentityError::Git {
                args: args.join(" "),
                error,
            })
    }
}

impl RevisionSource for GitCli {
    fn head_commit(&self) -> Result<String, IdentityError> {
        self.run(&["rev-parse", "HEAD"])
            .map(|output| output.trim().to_owned())
    }

    fn pull_request_heads(&self) -> Result<String, IdentityError> {
        self.run(&["ls-remote", "origin", PULL_REQUEST_REFS])
    }
}

/// Names a run after the pull request or commit it tested.
#[derive(Clone, Debug)]
pub struct ResultsNameResolver<S> {
    source: S,
}

impl<S: RevisionSource> ResultsNameResolver<S> {
    /// Creates a resolver reading revisions from `source`.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Returns `CRI-O Pull Request <n>` if the checked out commit is the head
    /// of a pull request, `CRI-O Commit <short id>` otherwise, and
    /// `CRI-O Run ID <uuid>` if the commit can't be determined.
    pub fn resolve(&self) -> String {
        let head = match self.source.head_commit() {
            Ok(head) if !head.is_empty() => head,
            Ok(_) => {
                debug!("no commit checked out, using a run id");
                return format!("CRI-O Run ID {}", Uuid::new_v4());
            }
            Err(error) => {
                debug!("{}", DisplayErrorChain::new(error));
                return format!("CRI-O Run ID {}", Uuid::new_v4());
            }
        };

        match self.source.pull_request_heads() {
            Ok(listing) => {
                if let Some(pr_number) = find_pull_request(&listing, &head) {
                    return format!("CRI-O Pull Request {pr_number}");
                }
                debug!("commit {head} is not the head of any pull request");
            }
            Err(error) => debug!("{}", DisplayErrorChain::new(error)),
        }

        let short = head.get(..8).unwrap_or(&head);
        format!("CRI-O Commit {short}")
    }
}

/// Finds the pull request whose head is `head` in `git ls-remote` output.
fn find_pull_request<'a>(listing: &'a str, head: &str) -> Option<&'a str> {
    listing.lines().find_map(|line| {
        let mut fields = line.split_whitespace();
        let commit = fields.next()?;
        let reference = fields.next()?;
        if commit != head {
            return None;
        }
        // refs/pull/<n>/head
        reference.split('/').nth(2).filter(|n| !n.is_empty())
    })
}
