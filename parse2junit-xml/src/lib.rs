// Copyright (c) The parse2junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generate and read JUnit reports in Rust.
//!
//! The model mirrors the JUnit XML schema closely enough to read reports
//! produced by other tools (including nested `<testsuites>` and `<testsuite>`
//! elements) and to write a normalized, flat report back out.

mod deserialize;
mod errors;
mod report;
mod serialize;

pub use errors::*;
pub use report::*;
