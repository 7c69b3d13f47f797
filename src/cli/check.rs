//! `graphgate check`

use super::EXIT_BLOCKED;
use crate::config::{load_config_file, load_project_config, GateConfig};
use crate::models::Severity;
use crate::pipeline::{AnalyzerBuilder, CancellationToken};
use crate::reporters;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

pub(super) struct CheckArgs {
    pub path: PathBuf,
    pub format: String,
    pub output: Option<PathBuf>,
    pub block_on: Vec<Severity>,
    pub config: Option<PathBuf>,
    pub workers: Option<usize>,
}

pub(super) fn run(args: CheckArgs) -> Result<ExitCode> {
    let root = args
        .path
        .canonicalize()
        .with_context(|| format!("Path does not exist: {}", args.path.display()))?;

    let mut config = match &args.config {
        Some(file) => load_config_file(file)
            .with_context(|| format!("Failed to load config {}", file.display()))?,
        None => load_project_config(&root),
    };
    apply_overrides(&mut config, &args);

    let analyzer = AnalyzerBuilder::new(config).build()?;
    info!(
        "Checking {} with {} workers",
        root.display(),
        analyzer.workers()
    );

    let analysis = analyzer.analyze_path(&root, &CancellationToken::new())?;
    let rendered = reporters::report(&analysis.result, &args.format)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Report written to {}", path.display());
        }
        None => print!("{}", rendered),
    }

    if analysis.result.blocked {
        Ok(ExitCode::from(EXIT_BLOCKED))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Command-line flags win over the config file. A `--block-on` severity
/// is dropped from `warn_on` so the two sets stay disjoint.
fn apply_overrides(config: &mut GateConfig, args: &CheckArgs) {
    if !args.block_on.is_empty() {
        config.severity.block_on = args.block_on.iter().copied().collect();
        config
            .severity
            .warn_on
            .retain(|s| !args.block_on.contains(s));
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(block_on: Vec<Severity>, workers: Option<usize>) -> CheckArgs {
        CheckArgs {
            path: PathBuf::from("."),
            format: "text".to_string(),
            output: None,
            block_on,
            config: None,
            workers,
        }
    }

    #[test]
    fn test_block_on_flag_replaces_config() {
        let mut config = GateConfig::default();
        config.severity.warn_on.insert(Severity::Warning);
        apply_overrides(&mut config, &args(vec![Severity::Warning], Some(2)));

        assert_eq!(
            config.severity.block_on.iter().copied().collect::<Vec<_>>(),
            vec![Severity::Warning]
        );
        assert!(config.severity.warn_on.is_empty());
        assert_eq!(config.workers, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_no_flags_keep_config() {
        let mut config = GateConfig::default();
        apply_overrides(&mut config, &args(Vec::new(), None));
        assert!(config.severity.block_on.contains(&Severity::Critical));
        assert!(config.severity.block_on.contains(&Severity::Error));
        assert_eq!(config.workers, 0);
    }
}
