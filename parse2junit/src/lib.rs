// Copyright (c) The parse2junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Convert CI test results into a single JUnit report.
//!
//! `parse2junit` reads TAP-like integration logs (`testout.txt`) and JUnit
//! reports from Kubernetes e2e runs (`junit_NN.xml`), and writes one flat
//! JUnit report combining all of them:
//!
//! ```text
//! parse2junit [OPTIONS] <INPUTS>... <OUTPUT>
//! ```
//!
//! Pass `-` as the output to write the report to standard output.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod exit_codes;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
pub use exit_codes::Parse2JunitExitCode;
#[doc(hidden)]
pub use output::{OutputContext, OutputWriter, StderrStyles};
