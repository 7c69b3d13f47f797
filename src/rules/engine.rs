//! Rule execution engine
//!
//! Runs every enabled rule against every file in parallel (rayon), each
//! (file, rule) pair as an independent unit:
//! - panics and `Err` returns are caught and turned into a warning
//!   finding, so one bad rule never aborts the run
//! - cancellation is checked before each unit
//! - findings are merged by a canonical sort, so scheduling order never
//!   leaks into the output

use super::{RuleContext, RuleDefinition, RuleRegistry, RuleScope};
use crate::config::{GateConfig, ThresholdValue};
use crate::error::{Diagnostic, DiagnosticKind, GateError, GateResult};
use crate::graph::{KnowledgeGraph, ParsedFile, QueryEngine, SourceFile};
use crate::models::{Finding, Severity};
use crate::pipeline::CancellationToken;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, error, info};

/// Rule name carried by findings that report a failed rule
pub const RULE_EXECUTION_ERROR: &str = "rule-execution-error";

struct ActiveRule {
    def: RuleDefinition,
    severity: Severity,
    severity_overridden: bool,
    thresholds: BTreeMap<String, ThresholdValue>,
}

/// Enabled rules with configuration applied
pub struct RuleEngine {
    rules: Vec<ActiveRule>,
}

impl RuleEngine {
    pub fn new(registry: &RuleRegistry, config: &GateConfig) -> Self {
        let rules = registry
            .iter()
            .filter(|def| config.rule_enabled(&def.name))
            .map(|def| {
                let over = config.rules.get(&def.name);
                let severity = over.and_then(|o| o.severity);
                ActiveRule {
                    def: def.clone(),
                    severity: severity.unwrap_or(def.severity),
                    severity_overridden: severity.is_some(),
                    thresholds: over.map(|o| o.thresholds.clone()).unwrap_or_default(),
                }
            })
            .collect::<Vec<_>>();

        let disabled = registry.len() - rules.len();
        if disabled > 0 {
            debug!("{} rules disabled by configuration", disabled);
        }
        Self { rules }
    }

    /// Names of the rules that will run, in name order
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.def.name.as_str()).collect()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Run all rules over all files. Call inside the thread pool that
    /// should do the work.
    pub fn run(
        &self,
        graph: &KnowledgeGraph,
        parsed: &[ParsedFile],
        cancel: &CancellationToken,
    ) -> GateResult<Vec<Finding>> {
        let start = Instant::now();
        let query = QueryEngine::new(graph);

        let files: Vec<(&SourceFile, &ParsedFile)> = parsed
            .iter()
            .filter_map(|p| graph.file(&p.path).map(|f| (f, p)))
            .collect();
        let units: Vec<(usize, usize)> = (0..files.len())
            .flat_map(|f| (0..self.rules.len()).map(move |r| (f, r)))
            .collect();

        info!(
            "Running {} rules over {} files ({} units)",
            self.rules.len(),
            files.len(),
            units.len()
        );

        let mut findings: Vec<Finding> = units
            .par_iter()
            .flat_map_iter(|&(f, r)| {
                if cancel.is_cancelled() {
                    return Vec::new();
                }
                let (file, parsed) = files[f];
                self.run_one(&self.rules[r], file, parsed, graph, &query)
            })
            .collect();

        if cancel.is_cancelled() {
            return Err(GateError::Cancelled);
        }

        findings.sort_by(|a, b| a.canonical_cmp(b));
        debug!(
            "Rule phase produced {} findings in {:?}",
            findings.len(),
            start.elapsed()
        );
        Ok(findings)
    }

    fn run_one(
        &self,
        rule: &ActiveRule,
        file: &SourceFile,
        parsed: &ParsedFile,
        graph: &KnowledgeGraph,
        query: &QueryEngine<'_>,
    ) -> Vec<Finding> {
        let mut ctx = RuleContext::new(
            &rule.def.name,
            rule.severity,
            file,
            &parsed.tree,
            graph.symbols_in(&file.path),
        )
        .with_thresholds(&rule.thresholds);
        if rule.def.scope == RuleScope::Graph {
            ctx = ctx.with_query(query);
        }

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| (rule.def.check)(&ctx)));

        match outcome {
            Ok(Ok(mut findings)) => {
                if rule.severity_overridden {
                    for finding in findings.iter_mut() {
                        finding.severity = rule.severity;
                    }
                }
                findings
            }
            Ok(Err(e)) => {
                error!("Rule {} failed on {}: {}", rule.def.name, file.path, e);
                vec![execution_error(&rule.def.name, &file.path, &e.to_string())]
            }
            Err(panic_info) => {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "unknown panic".to_string()
                };
                error!("Rule {} panicked on {}: {}", rule.def.name, file.path, panic_msg);
                vec![execution_error(
                    &rule.def.name,
                    &file.path,
                    &format!("panic: {}", panic_msg),
                )]
            }
        }
    }
}

fn execution_error(rule: &str, path: &str, reason: &str) -> Finding {
    Finding::new(
        RULE_EXECUTION_ERROR,
        Severity::Warning,
        path,
        1,
        1,
        format!("rule '{}' failed on {}: {}", rule, path, reason),
    )
}

/// Per-rule configuration naming rules that do not exist
pub fn unknown_rule_configs(registry: &RuleRegistry, config: &GateConfig) -> Vec<Diagnostic> {
    config
        .rules
        .keys()
        .filter(|name| !registry.contains(name))
        .map(|name| {
            Diagnostic::new(
                DiagnosticKind::UnknownRuleConfig,
                format!("configuration for unknown rule '{}'", name),
            )
        })
        .collect()
}
