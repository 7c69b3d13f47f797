//! Import specifier resolution
//!
//! Relative specifiers resolve against the importing file's directory,
//! aliased specifiers against the project root. A candidate path is probed
//! as written, then with each configured extension, then as a directory
//! `index` file. Bare specifiers that match no project file are external
//! packages; relative or aliased ones that match nothing are unresolved.

use crate::config::ResolveConfig;
use rustc_hash::FxHashSet;
use serde::Serialize;

/// Outcome of resolving one specifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionStatus {
    Resolved,
    External,
    Unresolved,
}

/// Emitted ESM specifiers often name the compiled `.js` file for a `.ts` source
const SCRIPT_EXTENSIONS: &[&str] = &[".js", ".jsx", ".mjs", ".cjs"];

pub struct ModuleResolver<'a> {
    known: FxHashSet<&'a str>,
    config: &'a ResolveConfig,
}

impl<'a> ModuleResolver<'a> {
    pub fn new(paths: impl IntoIterator<Item = &'a str>, config: &'a ResolveConfig) -> Self {
        Self {
            known: paths.into_iter().collect(),
            config,
        }
    }

    /// Resolve `specifier` as imported from the file at `from`
    pub fn resolve(&self, from: &str, specifier: &str) -> (ResolutionStatus, Option<String>) {
        if let Some(rewritten) = self.apply_alias(specifier) {
            return self.finish(normalize(&rewritten), ResolutionStatus::Unresolved);
        }

        if is_relative(specifier) {
            let joined = match parent_dir(from) {
                "" => specifier.to_string(),
                dir => format!("{}/{}", dir, specifier),
            };
            return self.finish(normalize(&joined), ResolutionStatus::Unresolved);
        }

        if specifier.starts_with('/') {
            return (ResolutionStatus::Unresolved, None);
        }

        // bare specifiers may still name a project path (baseUrl-style imports)
        self.finish(normalize(specifier), ResolutionStatus::External)
    }

    fn finish(
        &self,
        candidate: Option<String>,
        miss: ResolutionStatus,
    ) -> (ResolutionStatus, Option<String>) {
        match candidate.and_then(|c| self.probe(&c)) {
            Some(path) => (ResolutionStatus::Resolved, Some(path)),
            None => (miss, None),
        }
    }

    /// Longest matching alias prefix wins
    fn apply_alias(&self, specifier: &str) -> Option<String> {
        self.config
            .aliases
            .iter()
            .filter(|(prefix, _)| specifier.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(prefix, target)| format!("{}{}", target, &specifier[prefix.len()..]))
    }

    fn probe(&self, candidate: &str) -> Option<String> {
        if candidate.is_empty() {
            return self.probe_index("");
        }
        if self.known.contains(candidate) {
            return Some(candidate.to_string());
        }
        for ext in &self.config.extensions {
            let path = format!("{}{}", candidate, ext);
            if self.known.contains(path.as_str()) {
                return Some(path);
            }
        }
        if let Some(found) = self.probe_index(candidate) {
            return Some(found);
        }

        let stem = SCRIPT_EXTENSIONS
            .iter()
            .find_map(|ext| candidate.strip_suffix(ext))?;
        self.config
            .extensions
            .iter()
            .map(|ext| format!("{}{}", stem, ext))
            .find(|path| self.known.contains(path.as_str()))
    }

    fn probe_index(&self, dir: &str) -> Option<String> {
        self.config
            .extensions
            .iter()
            .map(|ext| match dir {
                "" => format!("index{}", ext),
                _ => format!("{}/index{}", dir, ext),
            })
            .find(|path| self.known.contains(path.as_str()))
    }
}

fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Collapse `.` and `..` segments. `None` if the path climbs above the root.
pub fn normalize(path: &str) -> Option<String> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            s => segments.push(s),
        }
    }
    Some(segments.join("/"))
}
