//! Configuration module for graphgate
//!
//! This module handles:
//! - Project-level configuration (graphgate.toml / .graphgaterc.json)
//! - Blocking and warning severity sets
//! - Role classification patterns and complexity toggles
//! - Per-rule enablement, severity and threshold overrides

mod project_config;

pub use project_config::{
    load_config_file, load_project_config, ComplexityConfig, ExcludeConfig, GateConfig,
    ResolveConfig, RoleConfig, RolePattern, RuleOverride, SeverityConfig, SuppressionConfig,
    ThresholdValue, DEFAULT_EXCLUDE_PATTERNS,
};
