//! graphgate - knowledge-graph powered change gate
//!
//! Parses a TypeScript/JavaScript project into an import graph, runs
//! analysis rules over it, and exits non-zero when the blocking policy
//! trips.

use clap::Parser;
use graphgate::cli;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    // RUST_LOG wins; otherwise warnings, or debug with --verbose
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("graphgate={}", default_level)));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    cli::run(cli)
}
