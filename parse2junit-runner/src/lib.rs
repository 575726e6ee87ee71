// Copyright (c) The parse2junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core logic for parse2junit.
//!
//! parse2junit reads test results produced by CI jobs (TAP-like integration
//! logs and JUnit XML e2e reports) and merges them into a single, flat JUnit
//! report. The pieces here are, leaf-first:
//!
//! * [`line_matcher`]: classifies individual integration log lines.
//! * [`parsers`]: one parser per input format, plus the registry that picks a
//!   parser by file name.
//! * [`merge`]: drives the parsers over every input and builds the report.
//! * [`identity`]: derives the run name and hostname stamped on the report.
//! * [`report_writer`]: writes the report to a file or standard output.

pub mod errors;
pub mod identity;
pub mod line_matcher;
pub mod merge;
pub mod parsers;
pub mod report_writer;
