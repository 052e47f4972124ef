//! # rma CLI
//!
//! Command-line interface for the RNA 3D Motif Atlas update pipeline.
//!
//! This binary provides human-friendly access to `rma-core` functionality.
//! Run `rma --help` for usage information.

mod cli;

use std::process::ExitCode;

fn main() -> ExitCode {
    cli::run()
}
