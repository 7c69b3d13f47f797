//! Project-level configuration support
//!
//! Loads per-project configuration from `graphgate.toml` or
//! `.graphgaterc.json` in the repository root.
//!
//! # Configuration Format
//!
//! ```toml
//! # graphgate.toml
//! workers = 8
//!
//! [severity]
//! block_on = ["critical", "error"]
//! warn_on = ["warning"]
//!
//! [roles]
//! patterns = [{ pattern = "src/http/**", role = "controller" }]
//!
//! [complexity]
//! nullish_coalescing = true
//!
//! [rules.complex-function]
//! severity = "error"
//! thresholds = { max_complexity = 15 }
//!
//! [rules.large-file]
//! enabled = false
//!
//! [resolve]
//! aliases = { "@/" = "src/" }
//!
//! [exclude]
//! paths = ["generated/"]
//! ```

use crate::error::GateError;
use crate::models::{FileRole, Severity};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, warn};

/// Built-in default exclusion patterns for vendored and generated code.
/// These are applied automatically unless `skip_defaults = true` in config.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    "**/node_modules/**",
    "**/vendor/**",
    "**/dist/**",
    "**/build/**",
    "**/coverage/**",
    "**/*.min.js",
    "**/*.bundle.js",
    "**/*.d.ts",
];

/// Project-level configuration loaded from graphgate.toml or similar
#[derive(Debug, Clone, Deserialize, Default)]
pub struct GateConfig {
    /// Worker threads for parsing and rule execution (0 = auto)
    #[serde(default)]
    pub workers: usize,

    /// Blocking policy
    #[serde(default)]
    pub severity: SeverityConfig,

    /// Role classification
    #[serde(default)]
    pub roles: RoleConfig,

    /// Decision points counted toward cyclomatic complexity
    #[serde(default)]
    pub complexity: ComplexityConfig,

    /// Per-rule overrides, keyed by rule name
    #[serde(default)]
    pub rules: BTreeMap<String, RuleOverride>,

    /// Inline suppression syntax
    #[serde(default)]
    pub suppression: SuppressionConfig,

    /// Import specifier resolution
    #[serde(default)]
    pub resolve: ResolveConfig,

    /// Path exclusion patterns
    #[serde(default)]
    pub exclude: ExcludeConfig,
}

/// Which severities block the run and which only warn
#[derive(Debug, Clone, Deserialize)]
pub struct SeverityConfig {
    #[serde(default = "default_block_on", alias = "blockOn")]
    pub block_on: BTreeSet<Severity>,

    #[serde(default, alias = "warnOn")]
    pub warn_on: BTreeSet<Severity>,
}

fn default_block_on() -> BTreeSet<Severity> {
    [Severity::Critical, Severity::Error].into_iter().collect()
}

impl Default for SeverityConfig {
    fn default() -> Self {
        Self {
            block_on: default_block_on(),
            warn_on: BTreeSet::new(),
        }
    }
}

/// A glob pattern assigning a role
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RolePattern {
    pub pattern: String,
    pub role: FileRole,
}

impl RolePattern {
    pub fn new(pattern: &str, role: FileRole) -> Self {
        Self {
            pattern: pattern.to_string(),
            role,
        }
    }
}

/// Role classification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoleConfig {
    /// Custom patterns, checked before the built-in ones
    #[serde(alias = "rolePatterns")]
    pub patterns: Vec<RolePattern>,

    /// Top-level directories whose contents are always tests
    #[serde(alias = "testRoots")]
    pub test_roots: Vec<String>,

    /// Append the built-in patterns after the custom ones
    #[serde(alias = "useDefaults")]
    pub use_defaults: bool,
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            test_roots: vec![
                "test".to_string(),
                "tests".to_string(),
                "__tests__".to_string(),
            ],
            use_defaults: true,
        }
    }
}

/// Toggles for each family of decision points
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ComplexityConfig {
    pub conditionals: bool,
    pub ternaries: bool,
    pub loops: bool,
    #[serde(alias = "logicalOperators")]
    pub logical_operators: bool,
    #[serde(alias = "switchCases")]
    pub switch_cases: bool,
    #[serde(alias = "catchClauses")]
    pub catch_clauses: bool,
    #[serde(alias = "nullishCoalescing")]
    pub nullish_coalescing: bool,
    #[serde(alias = "optionalChaining")]
    pub optional_chaining: bool,
}

impl Default for ComplexityConfig {
    fn default() -> Self {
        Self {
            conditionals: true,
            ternaries: true,
            loops: true,
            logical_operators: true,
            switch_cases: true,
            catch_clauses: true,
            nullish_coalescing: false,
            optional_chaining: false,
        }
    }
}

/// Configuration override for a specific rule
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RuleOverride {
    /// Whether the rule is enabled (default: true)
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Override the declared severity
    #[serde(default)]
    pub severity: Option<Severity>,

    /// Rule-specific threshold overrides
    #[serde(default)]
    pub thresholds: BTreeMap<String, ThresholdValue>,
}

/// A threshold value can be an integer, float, boolean or string
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ThresholdValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
}

impl ThresholdValue {
    /// Get as i64 (floats are truncated)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ThresholdValue::Integer(v) => Some(*v),
            ThresholdValue::Float(v) => Some(*v as i64),
            _ => None,
        }
    }
}

/// Inline suppression syntax
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SuppressionConfig {
    /// Prefix glued to `disable-next-line`, `disable` and `enable`
    pub prefix: String,
}

impl Default for SuppressionConfig {
    fn default() -> Self {
        Self {
            prefix: "graphgate-".to_string(),
        }
    }
}

/// Module resolution settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Extensions probed, in order, when a specifier omits one
    pub extensions: Vec<String>,

    /// Bare-specifier prefixes rewritten to project paths (`"@/" = "src/"`)
    pub aliases: BTreeMap<String, String>,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            extensions: [".ts", ".tsx", ".js", ".jsx", ".mjs", ".cjs"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            aliases: BTreeMap::new(),
        }
    }
}

/// Path exclusion configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ExcludeConfig {
    /// Paths/patterns to exclude from analysis
    #[serde(default)]
    pub paths: Vec<String>,

    /// If true, disable built-in default exclusion patterns
    #[serde(default)]
    pub skip_defaults: bool,
}

impl ExcludeConfig {
    /// Returns effective exclusion patterns (defaults + user patterns).
    /// If `skip_defaults` is true, only user patterns are returned.
    pub fn effective_patterns(&self) -> Vec<String> {
        let mut patterns = Vec::new();

        if !self.skip_defaults {
            patterns.extend(DEFAULT_EXCLUDE_PATTERNS.iter().map(|s| s.to_string()));
        }

        for p in &self.paths {
            if !patterns.contains(p) {
                patterns.push(p.clone());
            }
        }

        patterns
    }
}

impl GateConfig {
    /// Reject configurations that cannot produce a meaningful policy.
    /// Runs before any file is read.
    pub fn validate(&self) -> Result<(), GateError> {
        let overlap: Vec<String> = self
            .severity
            .block_on
            .intersection(&self.severity.warn_on)
            .map(|s| s.to_string())
            .collect();
        if !overlap.is_empty() {
            return Err(GateError::InvalidConfig(format!(
                "severities listed in both block_on and warn_on: {}",
                overlap.join(", ")
            )));
        }

        for ext in &self.resolve.extensions {
            if !ext.starts_with('.') {
                return Err(GateError::InvalidConfig(format!(
                    "resolve extension '{}' must start with '.'",
                    ext
                )));
            }
        }

        Ok(())
    }

    /// Whether a rule is switched on (rules default to enabled)
    pub fn rule_enabled(&self, name: &str) -> bool {
        self.rules
            .get(name)
            .and_then(|o| o.enabled)
            .unwrap_or(true)
    }

    pub fn rule_threshold(&self, rule: &str, key: &str) -> Option<&ThresholdValue> {
        self.rules.get(rule).and_then(|o| o.thresholds.get(key))
    }
}

/// Load project configuration from the repository root.
///
/// Searches for configuration files in this order:
/// 1. `graphgate.toml`
/// 2. `.graphgaterc.json`
///
/// Returns default configuration if no config file is found or the file
/// cannot be loaded.
pub fn load_project_config(repo_path: &Path) -> GateConfig {
    // Try TOML first (preferred format)
    let toml_path = repo_path.join("graphgate.toml");
    if toml_path.exists() {
        match load_config_file(&toml_path) {
            Ok(config) => {
                debug!("Loaded project config from {}", toml_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", toml_path.display(), e);
            }
        }
    }

    let json_path = repo_path.join(".graphgaterc.json");
    if json_path.exists() {
        match load_config_file(&json_path) {
            Ok(config) => {
                debug!("Loaded project config from {}", json_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", json_path.display(), e);
            }
        }
    }

    debug!("No project config found, using defaults");
    GateConfig::default()
}

/// Load configuration from an explicit file; the format follows the extension
pub fn load_config_file(path: &Path) -> anyhow::Result<GateConfig> {
    let content = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let config: GateConfig = if is_json {
        serde_json::from_str(&content)?
    } else {
        toml::from_str(&content)?
    };
    Ok(config)
}

#[cfg(test)]
mod tests;
