//! Analysis pipeline
//!
//! A run has three phases separated by barriers:
//!
//! 1. per-file analysis on the worker pool (parse, classify, measure,
//!    extract symbols, imports and suppression directives)
//! 2. single-threaded sealing of the knowledge graph in path order
//! 3. rule execution on the worker pool, merged by a canonical sort
//!
//! followed by suppression filtering and severity aggregation. Setup
//! problems (duplicate rule names, invalid configuration) surface from
//! [`AnalyzerBuilder::build`] before any file is touched. Cancellation is
//! checked between phases and between units of work; a cancelled run
//! returns [`GateError::Cancelled`] and nothing else.

use crate::aggregate::{BlockingPolicy, RunResult};
use crate::config::GateConfig;
use crate::discovery;
use crate::error::{Diagnostic, FileError, GateError, GateResult};
use crate::graph::resolve::normalize;
use crate::graph::{FileAnalyzer, FileRecord, KnowledgeGraph, RoleClassifier};
use crate::parsers::{ParserAdapter, ParserSet};
use crate::rules::{unknown_rule_configs, RuleEngine, RuleRegistry, RULE_EXECUTION_ERROR};
use crate::suppression::{dead_suppressions, DirectiveParser, SuppressionEngine};
use rayon::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Run-wide cancellation signal, cheap to clone and share across threads
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// One source file handed to the analyzer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInput {
    /// Project-relative, `/`-separated
    pub path: String,
    pub text: String,
}

impl SourceInput {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// A completed run: the sealed graph and the gate verdict
#[derive(Debug)]
pub struct Analysis {
    pub graph: KnowledgeGraph,
    pub result: RunResult,
}

pub struct AnalyzerBuilder {
    config: GateConfig,
    registry: Option<RuleRegistry>,
    parsers: ParserSet,
}

impl AnalyzerBuilder {
    pub fn new(config: GateConfig) -> Self {
        Self {
            config,
            registry: None,
            parsers: ParserSet::default(),
        }
    }

    /// Use this registry instead of the built-in rules
    pub fn rules(mut self, registry: RuleRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Add a parser adapter; it wins over earlier adapters for shared
    /// extensions
    pub fn parser(mut self, adapter: Arc<dyn ParserAdapter>) -> Self {
        self.parsers = self.parsers.with_adapter(adapter);
        self
    }

    /// Validate everything that can be validated without reading a file
    pub fn build(self) -> GateResult<Analyzer> {
        self.config.validate()?;
        let roles = RoleClassifier::new(&self.config.roles)?;
        let registry = match self.registry {
            Some(registry) => registry,
            None => RuleRegistry::with_builtin()?,
        };

        let setup_diagnostics = unknown_rule_configs(&registry, &self.config);
        for diagnostic in &setup_diagnostics {
            warn!("{}", diagnostic.message);
        }

        let workers = worker_count(self.config.workers);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()?;

        let engine = RuleEngine::new(&registry, &self.config);
        debug!(
            "Analyzer ready: {} of {} rules enabled, {} workers",
            engine.rule_count(),
            registry.len(),
            workers
        );

        Ok(Analyzer {
            directives: DirectiveParser::new(self.config.suppression.prefix.clone()),
            policy: BlockingPolicy::new(&self.config.severity),
            config: self.config,
            registry,
            parsers: self.parsers,
            roles,
            engine,
            pool,
            setup_diagnostics,
        })
    }
}

/// 0 means one worker per available core, capped at 16
fn worker_count(configured: usize) -> usize {
    if configured == 0 {
        std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(4)
            .min(16)
    } else {
        configured
    }
}

/// A configured, reusable analyzer. Each call to `analyze` is an
/// independent run.
pub struct Analyzer {
    config: GateConfig,
    registry: RuleRegistry,
    parsers: ParserSet,
    roles: RoleClassifier,
    directives: DirectiveParser,
    engine: RuleEngine,
    policy: BlockingPolicy,
    pool: rayon::ThreadPool,
    setup_diagnostics: Vec<Diagnostic>,
}

impl Analyzer {
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn parsers(&self) -> &ParserSet {
        &self.parsers
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Analyze in-memory sources
    pub fn analyze(
        &self,
        inputs: Vec<SourceInput>,
        cancel: &CancellationToken,
    ) -> GateResult<Analysis> {
        self.run(inputs, Vec::new(), cancel)
    }

    /// Discover and read source files under `root`, then analyze them.
    /// Unreadable files become diagnostics.
    pub fn analyze_path(
        &self,
        root: &Path,
        cancel: &CancellationToken,
    ) -> GateResult<Analysis> {
        let paths = discovery::discover(root, &self.config.exclude, &self.parsers)?;
        info!("Discovered {} source files under {}", paths.len(), root.display());

        if cancel.is_cancelled() {
            return Err(GateError::Cancelled);
        }

        let loaded: Vec<Result<SourceInput, FileError>> = self.pool.install(|| {
            paths
                .par_iter()
                .map(|rel| {
                    std::fs::read_to_string(root.join(rel))
                        .map(|text| SourceInput::new(rel.clone(), text))
                        .map_err(|e| FileError::read(rel.clone(), e.to_string()))
                })
                .collect()
        });

        let mut inputs = Vec::with_capacity(loaded.len());
        let mut errors = Vec::new();
        for item in loaded {
            match item {
                Ok(input) => inputs.push(input),
                Err(e) => {
                    warn!("Skipping {}", e);
                    errors.push(e);
                }
            }
        }

        self.run(inputs, errors, cancel)
    }

    fn run(
        &self,
        inputs: Vec<SourceInput>,
        read_errors: Vec<FileError>,
        cancel: &CancellationToken,
    ) -> GateResult<Analysis> {
        let start = Instant::now();
        let mut diagnostics = self.setup_diagnostics.clone();
        diagnostics.extend(read_errors.iter().map(Diagnostic::from));

        let mut inputs = inputs;
        inputs.retain_mut(|input| match canonical_path(&input.path) {
            Some(path) => {
                input.path = path;
                true
            }
            None => {
                let err = FileError::invalid_path(input.path.as_str());
                warn!("Excluding {}", err);
                diagnostics.push(Diagnostic::from(&err));
                false
            }
        });

        // Phase 1: independent per-file records
        check(cancel)?;
        let analyzer = FileAnalyzer::new(
            &self.parsers,
            &self.roles,
            self.config.complexity,
            &self.directives,
        );
        let outcomes: Vec<Option<Result<FileRecord, FileError>>> = self.pool.install(|| {
            inputs
                .par_iter()
                .map(|input| {
                    if cancel.is_cancelled() {
                        return None;
                    }
                    Some(analyzer.analyze(&input.path, &input.text))
                })
                .collect()
        });
        check(cancel)?;

        let mut records = Vec::with_capacity(outcomes.len());
        for outcome in outcomes.into_iter().flatten() {
            match outcome {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!("Excluding {}", e);
                    diagnostics.push(Diagnostic::from(&e));
                }
            }
        }
        info!(
            "Analyzed {} files ({} excluded)",
            records.len(),
            inputs.len() - records.len()
        );

        // Phase 2: seal
        check(cancel)?;
        let sealed = KnowledgeGraph::seal(records, &self.config.resolve);
        diagnostics.extend(sealed.diagnostics);
        let graph = sealed.graph;
        let parsed = sealed.parsed;

        for file in &parsed {
            diagnostics.extend(dead_suppressions(&file.path, &file.directives, |rule| {
                rule == RULE_EXECUTION_ERROR || self.registry.contains(rule)
            }));
        }

        // Phase 3: rules
        check(cancel)?;
        let findings = self
            .pool
            .install(|| self.engine.run(&graph, &parsed, cancel))?;

        let suppressions = SuppressionEngine::new(
            parsed
                .iter()
                .map(|p| (p.path.as_str(), p.directives.as_slice())),
        );
        let (findings, suppressed) = suppressions.filter(findings);

        let mut result = self.policy.aggregate(findings);
        result.suppressed = suppressed;
        result.files_analyzed = graph.len();
        diagnostics.sort_by(|a, b| {
            a.file
                .cmp(&b.file)
                .then(a.line.cmp(&b.line))
                .then(a.kind.cmp(&b.kind))
                .then_with(|| a.message.cmp(&b.message))
        });
        result.diagnostics = diagnostics;

        info!(
            "Run finished in {:?}: {} findings ({} suppressed), blocked={}",
            start.elapsed(),
            result.total(),
            result.suppressed,
            result.blocked
        );

        Ok(Analysis { graph, result })
    }
}

/// Project-relative `/`-separated form of an input path
fn canonical_path(path: &str) -> Option<String> {
    normalize(&path.replace('\\', "/")).filter(|p| !p.is_empty())
}

fn check(cancel: &CancellationToken) -> GateResult<()> {
    if cancel.is_cancelled() {
        Err(GateError::Cancelled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiagnosticKind;
    use crate::models::Severity;
    use crate::rules::RuleDefinition;

    fn inputs(files: &[(&str, &str)]) -> Vec<SourceInput> {
        files.iter().map(|(p, t)| SourceInput::new(*p, *t)).collect()
    }

    #[test]
    fn test_token_is_shared_between_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_worker_count_caps_auto_detection() {
        assert!(worker_count(0) >= 1);
        assert!(worker_count(0) <= 16);
        assert_eq!(worker_count(3), 3);
    }

    #[test]
    fn test_custom_registry_replaces_builtin_rules() {
        let mut registry = RuleRegistry::new();
        registry
            .register(RuleDefinition::new("always", Severity::Info, |ctx| {
                Ok(vec![ctx.finding(1, 1, "seen")])
            }))
            .expect("register");
        let analyzer = AnalyzerBuilder::new(GateConfig::default())
            .rules(registry)
            .build()
            .expect("analyzer");
        let analysis = analyzer
            .analyze(inputs(&[("a.ts", "try {} catch (e) {}")]), &CancellationToken::new())
            .expect("run completes");
        let rules: Vec<_> = analysis.result.findings.iter().map(|f| f.rule.as_str()).collect();
        assert_eq!(rules, vec!["always"]);
    }

    #[test]
    fn test_overlapping_severity_sets_are_rejected() {
        let mut config = GateConfig::default();
        config.severity.warn_on.insert(Severity::Error);
        let err = AnalyzerBuilder::new(config).build().err();
        assert!(matches!(err, Some(GateError::InvalidConfig(_))));
    }

    #[test]
    fn test_cancelled_before_start_returns_no_result() {
        let analyzer = AnalyzerBuilder::new(GateConfig::default())
            .build()
            .expect("default analyzer");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = analyzer
            .analyze(inputs(&[("a.ts", "export const a = 1;")]), &cancel)
            .err();
        assert!(matches!(err, Some(GateError::Cancelled)));
    }

    #[test]
    fn test_parse_failure_excludes_only_that_file() {
        let analyzer = AnalyzerBuilder::new(GateConfig::default())
            .build()
            .expect("default analyzer");
        let analysis = analyzer
            .analyze(
                inputs(&[("good.ts", "export const ok = 1;"), ("bad.ts", "function (")]),
                &CancellationToken::new(),
            )
            .expect("run completes");

        assert_eq!(analysis.result.files_analyzed, 1);
        assert!(analysis.graph.contains("good.ts"));
        assert!(!analysis.graph.contains("bad.ts"));
        assert!(analysis
            .result
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::ParseError && d.file.as_deref() == Some("bad.ts")));
    }

    #[test]
    fn test_unknown_rule_config_is_a_diagnostic() {
        let mut config = GateConfig::default();
        config.rules.insert("no-such-rule".to_string(), Default::default());
        let analyzer = AnalyzerBuilder::new(config).build().expect("non-fatal");
        let analysis = analyzer
            .analyze(Vec::new(), &CancellationToken::new())
            .expect("empty run");
        assert!(analysis
            .result
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::UnknownRuleConfig));
        assert!(!analysis.result.blocked);
    }

    #[test]
    fn test_suppressed_findings_are_counted() {
        let analyzer = AnalyzerBuilder::new(GateConfig::default())
            .build()
            .expect("default analyzer");
        let source = "try { f(); }\n// graphgate-disable-next-line empty-catch\ncatch (e) {}\n";
        let analysis = analyzer
            .analyze(inputs(&[("a.ts", source)]), &CancellationToken::new())
            .expect("run completes");
        assert_eq!(analysis.result.suppressed, 1);
        assert!(analysis.result.findings.iter().all(|f| f.rule != "empty-catch"));
    }

    #[test]
    fn test_canonical_path() {
        assert_eq!(canonical_path("./src/a.ts").as_deref(), Some("src/a.ts"));
        assert_eq!(canonical_path("src\\lib\\b.ts").as_deref(), Some("src/lib/b.ts"));
        assert_eq!(canonical_path("src/x/../a.ts").as_deref(), Some("src/a.ts"));
        assert_eq!(canonical_path("../a.ts"), None);
        assert_eq!(canonical_path("./"), None);
    }
}
