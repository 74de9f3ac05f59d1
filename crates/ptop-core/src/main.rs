//! `prom-top` binary entry point.

use clap::Parser;
use ptop_core::cli::{execute, Cli};

fn main() -> std::process::ExitCode {
    execute(Cli::parse()).into()
}
