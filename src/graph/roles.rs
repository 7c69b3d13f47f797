//! File role classification
//!
//! Assigns each file a structural role from its project-relative path.
//! Patterns are checked in order and the first match wins:
//! custom patterns, then configured test roots, then the built-in
//! naming conventions. No match means [`FileRole::Unknown`].

use crate::config::{RoleConfig, RolePattern};
use crate::error::GateError;
use crate::models::FileRole;
use globset::{GlobBuilder, GlobMatcher};

/// Built-in patterns in priority order
const DEFAULT_ROLE_PATTERNS: &[(&str, FileRole)] = &[
    ("**/*.test.*", FileRole::Test),
    ("**/*.spec.*", FileRole::Test),
    ("**/__tests__/**", FileRole::Test),
    ("**/__mocks__/**", FileRole::Test),
    ("**/*.controller.*", FileRole::Controller),
    ("**/controllers/**", FileRole::Controller),
    ("**/*.service.*", FileRole::Service),
    ("**/services/**", FileRole::Service),
    ("**/*.repository.*", FileRole::Repository),
    ("**/*.repo.*", FileRole::Repository),
    ("**/repositories/**", FileRole::Repository),
    ("**/*.config.*", FileRole::Config),
    ("**/config/**", FileRole::Config),
];

/// Pure path -> role classifier
#[derive(Debug, Clone)]
pub struct RoleClassifier {
    custom: Vec<(GlobMatcher, FileRole)>,
    test_roots: Vec<String>,
    defaults: Vec<(GlobMatcher, FileRole)>,
}

impl Default for RoleClassifier {
    fn default() -> Self {
        // Built-in patterns are known-valid
        Self::new(&RoleConfig::default()).unwrap_or(Self {
            custom: Vec::new(),
            test_roots: Vec::new(),
            defaults: Vec::new(),
        })
    }
}

impl RoleClassifier {
    pub fn new(config: &RoleConfig) -> Result<Self, GateError> {
        let custom = config
            .patterns
            .iter()
            .map(|p| compile(&p.pattern).map(|m| (m, p.role)))
            .collect::<Result<Vec<_>, _>>()?;

        let defaults = if config.use_defaults {
            DEFAULT_ROLE_PATTERNS
                .iter()
                .map(|(p, role)| compile(p).map(|m| (m, *role)))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            Vec::new()
        };

        let test_roots = config
            .test_roots
            .iter()
            .map(|r| r.trim_matches('/').to_string())
            .filter(|r| !r.is_empty())
            .collect();

        Ok(Self {
            custom,
            test_roots,
            defaults,
        })
    }

    /// Convenience for tests and embedders: custom patterns only
    pub fn from_patterns(patterns: &[RolePattern]) -> Result<Self, GateError> {
        Self::new(&RoleConfig {
            patterns: patterns.to_vec(),
            test_roots: Vec::new(),
            use_defaults: false,
        })
    }

    /// Classify a project-relative, `/`-separated path
    pub fn classify(&self, path: &str) -> FileRole {
        if let Some((_, role)) = self.custom.iter().find(|(m, _)| m.is_match(path)) {
            return *role;
        }

        if self.is_under_test_root(path) {
            return FileRole::Test;
        }

        self.defaults
            .iter()
            .find(|(m, _)| m.is_match(path))
            .map(|(_, role)| *role)
            .unwrap_or(FileRole::Unknown)
    }

    fn is_under_test_root(&self, path: &str) -> bool {
        self.test_roots.iter().any(|root| {
            path.strip_prefix(root.as_str())
                .map(|rest| rest.starts_with('/'))
                .unwrap_or(false)
        })
    }
}

fn compile(pattern: &str) -> Result<GlobMatcher, GateError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|e| GateError::InvalidConfig(format!("invalid role pattern '{}': {}", pattern, e)))
}
