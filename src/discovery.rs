//! Source file discovery
//!
//! Walks a project root respecting `.gitignore` and `.graphgateignore`,
//! keeps files some parser adapter can handle, and drops excluded paths.
//! Returned paths are project-relative, `/`-separated and sorted.

use crate::config::ExcludeConfig;
use crate::error::{GateError, GateResult};
use crate::parsers::ParserSet;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::Path;
use tracing::{debug, warn};

/// Per-project ignore file, same syntax as `.gitignore`
pub const IGNORE_FILE: &str = ".graphgateignore";

/// Compiled exclusion patterns
///
/// Patterns with glob metacharacters are matched as globs against the
/// relative path. Plain patterns are path prefixes: `vendor/` matches
/// `vendor/x.ts` but not `src/vendor/x.ts`.
#[derive(Debug)]
pub struct ExcludeMatcher {
    globs: GlobSet,
    prefixes: Vec<String>,
}

impl ExcludeMatcher {
    pub fn new(config: &ExcludeConfig) -> GateResult<Self> {
        let mut builder = GlobSetBuilder::new();
        let mut prefixes = Vec::new();

        for pattern in config.effective_patterns() {
            if pattern.contains(['*', '?', '[', '{']) {
                let glob = GlobBuilder::new(&pattern)
                    .literal_separator(true)
                    .build()
                    .map_err(|e| {
                        GateError::InvalidConfig(format!("exclude pattern '{}': {}", pattern, e))
                    })?;
                builder.add(glob);
            } else {
                prefixes.push(pattern.trim_start_matches("./").to_string());
            }
        }

        let globs = builder
            .build()
            .map_err(|e| GateError::InvalidConfig(format!("exclude patterns: {}", e)))?;
        Ok(Self { globs, prefixes })
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.globs.is_match(path) || self.prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }
}

/// Supported, non-excluded source files under `root`
pub fn discover(
    root: &Path,
    exclude: &ExcludeConfig,
    parsers: &ParserSet,
) -> GateResult<Vec<String>> {
    if !root.is_dir() {
        return Err(GateError::Io {
            path: root.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        });
    }

    let matcher = ExcludeMatcher::new(exclude)?;
    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(true)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(true)
        .require_git(false)
        .add_custom_ignore_filename(IGNORE_FILE);

    let mut files = Vec::new();
    let mut excluded = 0usize;

    for entry in builder.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let Some(rel) = relative_path(root, entry.path()) else {
            continue;
        };
        if !parsers.supports(&rel) {
            continue;
        }
        if matcher.is_excluded(&rel) {
            excluded += 1;
            continue;
        }
        files.push(rel);
    }

    files.sort();
    debug!(
        "Discovery: {} files kept, {} excluded by pattern",
        files.len(),
        excluded
    );
    Ok(files)
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}
