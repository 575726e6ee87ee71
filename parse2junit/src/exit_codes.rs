// Copyright (c) The parse2junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `parse2junit` failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum Parse2JunitExitCode {}

impl Parse2JunitExitCode {
    /// No errors occurred and the report was written.
    pub const OK: i32 = 0;

    /// None of the inputs produced a test suite, so no report was written.
    pub const NO_SUITES_PRODUCED: i32 = 4;

    /// Writing the report produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;

    /// A user issue happened while setting up a parse2junit invocation, such
    /// as invalid arguments.
    pub const SETUP_ERROR: i32 = 96;
}
