//! CLI command definitions and handlers

mod check;
mod rules;

use crate::error::GateError;
use crate::models::Severity;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit status when the blocking policy trips
pub const EXIT_BLOCKED: u8 = 1;
/// Exit status for setup errors (bad config, duplicate rules, unreadable root)
pub const EXIT_FATAL: u8 = 2;
/// Exit status for a cancelled run
pub const EXIT_CANCELLED: u8 = 130;

/// Parse and validate workers count (0-64, 0 = auto)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// graphgate - import-graph analysis that gates a change set
#[derive(Parser, Debug)]
#[command(name = "graphgate")]
#[command(
    version,
    about = "Build a knowledge graph of a TypeScript/JavaScript project, run analysis rules, and decide whether to block",
    after_help = "\
Examples:
  graphgate check .                          Check the current directory
  graphgate check . --format json            JSON output for CI tooling
  graphgate check . --block-on critical      Only critical findings block
  graphgate rules                            List registered rules"
)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a project and apply the blocking policy
    Check {
        /// Path to the project root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// Output file path (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Severities that block, comma separated (overrides config)
        #[arg(long, value_delimiter = ',')]
        block_on: Vec<Severity>,

        /// Configuration file (default: graphgate.toml or .graphgaterc.json in PATH)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Worker threads (0 = auto, overrides config)
        #[arg(long, value_parser = parse_workers, env = "GRAPHGATE_WORKERS")]
        workers: Option<usize>,
    },

    /// List registered rules
    Rules,
}

/// Run the parsed command and map the outcome to a process exit code
pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Commands::Check {
            path,
            format,
            output,
            block_on,
            config,
            workers,
        } => check::run(check::CheckArgs {
            path,
            format,
            output,
            block_on,
            config,
            workers,
        }),
        Commands::Rules => rules::run().map(|_| ExitCode::SUCCESS),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            if matches!(e.downcast_ref::<GateError>(), Some(GateError::Cancelled)) {
                eprintln!("graphgate: analysis cancelled");
                return ExitCode::from(EXIT_CANCELLED);
            }
            eprintln!("graphgate: {:#}", e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}
