//! Severity aggregation and the blocking decision
//!
//! `blocked` depends only on which severities survive suppression and on
//! `block_on`; the finding list itself never changes with the policy.

use crate::config::SeverityConfig;
use crate::error::Diagnostic;
use crate::models::{Finding, Severity};
use serde::Serialize;
use std::collections::BTreeSet;

/// Findings grouped by severity, each list in emission order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BySeverity {
    pub critical: Vec<Finding>,
    pub error: Vec<Finding>,
    pub warning: Vec<Finding>,
    pub info: Vec<Finding>,
}

impl BySeverity {
    pub fn get(&self, severity: Severity) -> &[Finding] {
        match severity {
            Severity::Critical => &self.critical,
            Severity::Error => &self.error,
            Severity::Warning => &self.warning,
            Severity::Info => &self.info,
        }
    }

    fn bucket(&mut self, severity: Severity) -> &mut Vec<Finding> {
        match severity {
            Severity::Critical => &mut self.critical,
            Severity::Error => &mut self.error,
            Severity::Warning => &mut self.warning,
            Severity::Info => &mut self.info,
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.get(severity).len()
    }
}

/// Outcome of one analysis run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    /// Surviving findings in canonical order
    pub findings: Vec<Finding>,
    pub by_severity: BySeverity,
    pub blocked: bool,
    /// A finding matched `warn_on`; never affects `blocked`
    pub warned: bool,
    /// Findings removed by inline suppressions
    pub suppressed: usize,
    pub files_analyzed: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl RunResult {
    pub fn total(&self) -> usize {
        self.findings.len()
    }

    /// Highest severity present, if any finding survived
    pub fn max_severity(&self) -> Option<Severity> {
        self.findings.iter().map(|f| f.severity).max()
    }
}

#[derive(Debug, Clone)]
pub struct BlockingPolicy {
    block_on: BTreeSet<Severity>,
    warn_on: BTreeSet<Severity>,
}

impl Default for BlockingPolicy {
    fn default() -> Self {
        Self::new(&SeverityConfig::default())
    }
}

impl BlockingPolicy {
    pub fn new(config: &SeverityConfig) -> Self {
        Self {
            block_on: config.block_on.clone(),
            warn_on: config.warn_on.clone(),
        }
    }

    pub fn blocks(&self, severity: Severity) -> bool {
        self.block_on.contains(&severity)
    }

    pub fn warns(&self, severity: Severity) -> bool {
        self.warn_on.contains(&severity)
    }

    /// Group findings and decide. Run metadata (diagnostics, counts) is
    /// left for the caller to fill in.
    pub fn aggregate(&self, findings: Vec<Finding>) -> RunResult {
        let mut by_severity = BySeverity::default();
        for finding in &findings {
            by_severity.bucket(finding.severity).push(finding.clone());
        }

        RunResult {
            blocked: findings.iter().any(|f| self.blocks(f.severity)),
            warned: findings.iter().any(|f| self.warns(f.severity)),
            by_severity,
            findings,
            ..RunResult::default()
        }
    }
}
