//! End-to-end tests for the analysis pipeline
//!
//! Exercise the public library API over in-memory sources and over
//! temporary project directories.

use graphgate::config::{load_project_config, GateConfig};
use graphgate::error::DiagnosticKind;
use graphgate::graph::QueryEngine;
use graphgate::models::{Finding, Severity};
use graphgate::pipeline::{Analysis, AnalyzerBuilder, CancellationToken, SourceInput};
use graphgate::rules::{RuleDefinition, RuleRegistry, RULE_EXECUTION_ERROR};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn inputs(files: &[(&str, &str)]) -> Vec<SourceInput> {
    files.iter().map(|(p, t)| SourceInput::new(*p, *t)).collect()
}

fn analyze(config: GateConfig, files: &[(&str, &str)]) -> Analysis {
    AnalyzerBuilder::new(config)
        .build()
        .expect("analyzer")
        .analyze(inputs(files), &CancellationToken::new())
        .expect("analysis")
}

/// A rule reporting lines 1 through 8 of every file
fn every_line(name: &str) -> RuleDefinition {
    RuleDefinition::new(name, Severity::Warning, |ctx| {
        Ok((1..=8).map(|line| ctx.finding(line, 1, "marker")).collect())
    })
}

fn analyze_with_rules(rules: Vec<RuleDefinition>, files: &[(&str, &str)]) -> Analysis {
    let mut registry = RuleRegistry::new();
    for rule in rules {
        registry.register(rule).expect("register");
    }
    AnalyzerBuilder::new(GateConfig::default())
        .rules(registry)
        .build()
        .expect("analyzer")
        .analyze(inputs(files), &CancellationToken::new())
        .expect("analysis")
}

fn lines_for(findings: &[Finding], rule: &str) -> Vec<u32> {
    findings
        .iter()
        .filter(|f| f.rule == rule)
        .map(|f| f.line)
        .collect()
}

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create dirs");
    }
    fs::write(path, content).expect("write file");
}

// ============================================================================
// Cycle detection
// ============================================================================

#[test]
fn test_no_edges_no_cycles() {
    let analysis = analyze(
        GateConfig::default(),
        &[
            ("a.ts", "export const a = 1;"),
            ("b.ts", "export const b = 2;"),
        ],
    );
    assert!(QueryEngine::new(&analysis.graph).find_circular_deps().is_empty());
    assert!(analysis.graph.edges().is_empty());
}

#[test]
fn test_two_file_cycle() {
    let analysis = analyze(
        GateConfig::default(),
        &[("a.ts", "import { b } from './b';"), ("b.ts", "import { a } from './a';")],
    );
    let query = QueryEngine::new(&analysis.graph);
    assert_eq!(
        query.find_circular_deps(),
        &[vec!["a.ts".to_string(), "b.ts".to_string()]]
    );
    assert!(analysis.result.blocked);
}

#[test]
fn test_three_file_cycle_independent_of_input_order() {
    let files = [
        ("a.ts", "import './b';"),
        ("b.ts", "import './c';"),
        ("c.ts", "import './a';"),
    ];
    let orders: [[usize; 3]; 3] = [[0, 1, 2], [2, 1, 0], [1, 2, 0]];

    for order in orders {
        let shuffled: Vec<_> = order.iter().map(|&i| files[i]).collect();
        let analysis = analyze(GateConfig::default(), &shuffled);
        let cycles = QueryEngine::new(&analysis.graph).find_circular_deps().to_vec();
        assert_eq!(
            cycles,
            vec![vec!["a.ts".to_string(), "b.ts".to_string(), "c.ts".to_string()]],
            "order {:?}",
            order
        );
    }
}

// ============================================================================
// Suppression
// ============================================================================

#[test]
fn test_disable_next_line_removes_exactly_one_line_for_one_rule() {
    let source = "const a = 1;\n// graphgate-disable-next-line marker-a\nconst b = 2;\nconst c = 3;\n";
    let analysis = analyze_with_rules(
        vec![every_line("marker-a"), every_line("marker-b")],
        &[("x.ts", source)],
    );
    let findings = &analysis.result.findings;
    assert_eq!(lines_for(findings, "marker-a"), vec![1, 2, 4, 5, 6, 7, 8]);
    assert_eq!(lines_for(findings, "marker-b"), (1..=8).collect::<Vec<_>>());
    assert_eq!(analysis.result.suppressed, 1);
}

#[test]
fn test_unclosed_disable_runs_past_end_of_file() {
    let source = "const a = 1;\n// graphgate-disable marker-a\nconst b = 2;\n";
    let analysis = analyze_with_rules(
        vec![every_line("marker-a"), every_line("marker-b")],
        &[("x.ts", source)],
    );
    let findings = &analysis.result.findings;
    // Lines 4..8 lie beyond the last line of the file
    assert_eq!(lines_for(findings, "marker-a"), vec![1]);
    assert_eq!(lines_for(findings, "marker-b").len(), 8);
}

#[test]
fn test_enable_without_disable_is_a_noop() {
    let source = "// graphgate-enable marker-a\nconst a = 1;\n";
    let analysis = analyze_with_rules(vec![every_line("marker-a")], &[("x.ts", source)]);
    assert_eq!(lines_for(&analysis.result.findings, "marker-a").len(), 8);
    assert_eq!(analysis.result.suppressed, 0);
    assert!(analysis
        .result
        .diagnostics
        .iter()
        .all(|d| d.kind != DiagnosticKind::DeadSuppression));
}

#[test]
fn test_disable_region_closed_by_enable() {
    let source = "\
const a = 1;
/* graphgate-disable marker-a -- generated block */
const b = 2;
const c = 3;
/* graphgate-enable marker-a */
const d = 4;
";
    let analysis = analyze_with_rules(vec![every_line("marker-a")], &[("x.ts", source)]);
    assert_eq!(
        lines_for(&analysis.result.findings, "marker-a"),
        vec![1, 5, 6, 7, 8]
    );
}

#[test]
fn test_suppression_of_unknown_rule_is_a_diagnostic() {
    let source = "// graphgate-disable-next-line no-such-rule\nconst a = 1;\n";
    let analysis = analyze(GateConfig::default(), &[("x.ts", source)]);
    let dead: Vec<_> = analysis
        .result
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::DeadSuppression)
        .collect();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].file.as_deref(), Some("x.ts"));
    assert_eq!(dead[0].line, Some(1));
}

// ============================================================================
// Blocking policy
// ============================================================================

#[test]
fn test_block_on_critical_ignores_error_and_info() {
    let mut registry = RuleRegistry::new();
    registry
        .register(RuleDefinition::new("err", Severity::Error, |ctx| {
            Ok(vec![ctx.finding(1, 1, "error finding")])
        }))
        .expect("register");
    registry
        .register(RuleDefinition::new("note", Severity::Info, |ctx| {
            Ok(vec![ctx.finding(1, 1, "info finding")])
        }))
        .expect("register");

    let mut config = GateConfig::default();
    config.severity.block_on = [Severity::Critical].into_iter().collect();
    let analysis = AnalyzerBuilder::new(config)
        .rules(registry)
        .build()
        .expect("analyzer")
        .analyze(inputs(&[("a.ts", "")]), &CancellationToken::new())
        .expect("analysis");

    assert!(!analysis.result.blocked);
    assert_eq!(analysis.result.by_severity.error.len(), 1);
    assert_eq!(analysis.result.by_severity.info.len(), 1);
}

#[test]
fn test_block_on_changes_only_blocked() {
    let files = [("a.ts", "import './b';"), ("b.ts", "import './a';")];

    let strict = analyze(GateConfig::default(), &files);
    let mut lax_config = GateConfig::default();
    lax_config.severity.block_on = [Severity::Critical].into_iter().collect();
    let lax = analyze(lax_config, &files);

    assert!(strict.result.blocked);
    assert!(!lax.result.blocked);
    assert_eq!(strict.result.findings, lax.result.findings);
    assert_eq!(strict.result.by_severity, lax.result.by_severity);
}

#[test]
fn test_always_failing_rule_keeps_other_findings() {
    let mut registry = RuleRegistry::with_builtin().expect("builtin rules");
    registry
        .register(RuleDefinition::new("always-fails", Severity::Critical, |_| {
            Err(anyhow::anyhow!("cannot evaluate"))
        }))
        .expect("register");

    let analysis = AnalyzerBuilder::new(GateConfig::default())
        .rules(registry)
        .build()
        .expect("analyzer")
        .analyze(
            inputs(&[("a.ts", "import './b';"), ("b.ts", "import './a';")]),
            &CancellationToken::new(),
        )
        .expect("analysis");

    let findings = &analysis.result.findings;
    assert!(findings.iter().any(|f| f.rule == "circular-dependency"));
    let failures: Vec<_> = findings
        .iter()
        .filter(|f| f.rule == RULE_EXECUTION_ERROR)
        .collect();
    assert_eq!(failures.len(), 2);
    assert!(failures.iter().all(|f| f.severity == Severity::Warning));
}

// ============================================================================
// Determinism
// ============================================================================

fn sample_project() -> Vec<(String, String)> {
    (0..30)
        .map(|i| {
            let next = (i * 7 + 3) % 30;
            (
                format!("src/mod{:02}.ts", i),
                format!(
                    "import {{ f{next} }} from './mod{next:02}';\n\
                     export function f{i}(x) {{\n  if (x > {i}) {{ return x && f{next}(x - 1); }}\n  try {{ return 0; }} catch (e) {{}}\n}}\n"
                ),
            )
        })
        .collect()
}

#[test]
fn test_rerun_is_byte_identical_across_worker_counts() {
    let project = sample_project();
    let files: Vec<(&str, &str)> = project
        .iter()
        .map(|(p, s)| (p.as_str(), s.as_str()))
        .collect();

    let render = |workers: usize| {
        let config = GateConfig {
            workers,
            ..GateConfig::default()
        };
        let analysis = analyze(config, &files);
        serde_json::to_string(&analysis.result).expect("serialize")
    };

    let serial = render(1);
    assert_eq!(serial, render(1));
    assert_eq!(serial, render(4));
    assert_eq!(serial, render(0));
}

// ============================================================================
// Project directories
// ============================================================================

#[test]
fn test_analyze_path_with_project_config() {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path();
    write(
        root,
        "graphgate.toml",
        r#"
[severity]
block_on = ["critical"]
warn_on = ["error"]

[rules.large-file]
enabled = false

[rules.complex-function]
thresholds = { max_complexity = 1 }
"#,
    );
    write(root, "src/a.ts", "import { b } from './b';\nexport function a(x) { return x ? b() : 0; }\n");
    write(root, "src/b.ts", "import { a } from './a';\nexport function b() { return a(1); }\n");
    write(root, "node_modules/dep/index.js", "module.exports = 1;\n");
    write(root, "README.md", "# readme\n");

    let config = load_project_config(root);
    let analyzer = AnalyzerBuilder::new(config).build().expect("analyzer");
    let analysis = analyzer
        .analyze_path(root, &CancellationToken::new())
        .expect("analysis");
    let result = &analysis.result;

    assert_eq!(result.files_analyzed, 2);
    assert!(!result.blocked);
    assert!(result.warned);
    assert!(result.findings.iter().any(|f| f.rule == "circular-dependency"));
    assert!(result.findings.iter().any(|f| f.rule == "complex-function" && f.file == "src/a.ts"));
    assert!(result.findings.iter().all(|f| f.rule != "large-file"));
}

#[test]
fn test_parse_errors_become_diagnostics() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "ok.ts", "export const ok = 1;\n");
    write(dir.path(), "broken.ts", "export function (\n");

    let analyzer = AnalyzerBuilder::new(GateConfig::default())
        .build()
        .expect("analyzer");
    let analysis = analyzer
        .analyze_path(dir.path(), &CancellationToken::new())
        .expect("analysis");

    assert_eq!(analysis.result.files_analyzed, 1);
    assert!(analysis
        .result
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::ParseError && d.file.as_deref() == Some("broken.ts")));
}

#[test]
fn test_unresolved_relative_import_is_diagnosed() {
    let analysis = analyze(
        GateConfig::default(),
        &[("a.ts", "import x from './missing';\nimport y from 'lodash';\n")],
    );
    let unresolved: Vec<_> = analysis
        .result
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::UnresolvedImport)
        .collect();
    assert_eq!(unresolved.len(), 1);
    assert!(unresolved[0].message.contains("./missing"));
}

// ============================================================================
// Input path normalization
// ============================================================================

fn graph_paths(analysis: &Analysis) -> Vec<&str> {
    analysis
        .graph
        .files()
        .iter()
        .map(|f| f.path.as_str())
        .collect()
}

#[test]
fn test_dot_prefixed_inputs_form_a_cycle() {
    let analysis = analyze(
        GateConfig::default(),
        &[
            ("./a.ts", "import { b } from './b';"),
            ("./b.ts", "import { a } from './a';"),
        ],
    );
    assert_eq!(graph_paths(&analysis), vec!["a.ts", "b.ts"]);
    assert_eq!(
        QueryEngine::new(&analysis.graph).find_circular_deps(),
        &[vec!["a.ts".to_string(), "b.ts".to_string()]]
    );
    assert!(analysis.result.blocked);
}

#[test]
fn test_backslash_separated_inputs_form_a_cycle() {
    let analysis = analyze(
        GateConfig::default(),
        &[("src\\a.ts", "import './b';"), ("src\\b.ts", "import './a';")],
    );
    assert_eq!(
        QueryEngine::new(&analysis.graph).find_circular_deps(),
        &[vec!["src/a.ts".to_string(), "src/b.ts".to_string()]]
    );
}

#[test]
fn test_equivalent_spellings_count_as_one_file() {
    let analysis = analyze(
        GateConfig::default(),
        &[
            ("a.ts", "export const a = 1;"),
            ("./a.ts", "export const a = 1;"),
        ],
    );
    assert_eq!(analysis.result.files_analyzed, 1);
    assert_eq!(graph_paths(&analysis), vec!["a.ts"]);
}

#[test]
fn test_path_above_root_is_excluded() {
    let analysis = analyze(
        GateConfig::default(),
        &[
            ("../outside.ts", "export const x = 1;"),
            ("inside.ts", "export const y = 2;"),
        ],
    );
    assert_eq!(graph_paths(&analysis), vec!["inside.ts"]);
    assert!(analysis
        .result
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::InvalidPath
            && d.file.as_deref() == Some("../outside.ts")));
}
