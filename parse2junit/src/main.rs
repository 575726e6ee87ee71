// Copyright (c) The parse2junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use clap::Parser;
use color_eyre::Result;
use parse2junit::{OutputWriter, Parse2JunitApp, Parse2JunitExitCode};

fn main() -> Result<()> {
    color_eyre::install()?;
    let _ = enable_ansi_support::enable_ansi_support();

    let opts = match Parse2JunitApp::try_parse() {
        Ok(opts) => opts,
        Err(error) => {
            // --help and --version are reported as errors that go to stdout.
            let code = if error.use_stderr() {
                Parse2JunitExitCode::SETUP_ERROR
            } else {
                Parse2JunitExitCode::OK
            };
            let _ = error.print();
            std::process::exit(code);
        }
    };
    let output = opts.init_output();

    match opts.exec(&mut OutputWriter::default()) {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            error.display_to_stderr(&output.stderr_styles());
            std::process::exit(error.process_exit_code())
        }
    }
}
