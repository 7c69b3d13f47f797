//! Rule contract and registry
//!
//! A rule is a plain record: a unique name, a declared severity, a
//! description, a category, a scope and a check function. The check is
//! handed a [`RuleContext`] for one file and returns zero or more
//! findings. `File` rules see only that file; `Graph` rules additionally
//! see the sealed knowledge graph and its query engine.
//!
//! ```ignore
//! let rule = RuleDefinition::new("no-todo", Severity::Info, |ctx| {
//!     let mut findings = Vec::new();
//!     ctx.walk(&mut Visitors::new().on("comment", |node| {
//!         if node.text().contains("TODO") {
//!             findings.push(ctx.finding_at(node, "unresolved TODO"));
//!         }
//!     }));
//!     Ok(findings)
//! });
//! registry.register(rule)?;
//! ```

pub mod builtin;
mod engine;

pub use engine::{unknown_rule_configs, RuleEngine, RULE_EXECUTION_ERROR};

use crate::config::ThresholdValue;
use crate::error::GateError;
use crate::graph::{KnowledgeGraph, QueryEngine, SourceFile};
use crate::models::{Finding, Severity, Symbol};
use crate::parsers::{Node, SyntaxTree, Visitors};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Check function shared across worker threads
pub type CheckFn = Arc<dyn Fn(&RuleContext<'_>) -> anyhow::Result<Vec<Finding>> + Send + Sync>;

/// What a rule needs to see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleScope {
    /// One file's tree and metadata
    File,
    /// Also the sealed graph and query engine
    Graph,
}

#[derive(Clone)]
pub struct RuleDefinition {
    pub name: String,
    pub severity: Severity,
    pub description: String,
    pub category: String,
    pub scope: RuleScope,
    pub check: CheckFn,
}

impl std::fmt::Debug for RuleDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleDefinition")
            .field("name", &self.name)
            .field("severity", &self.severity)
            .field("category", &self.category)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl RuleDefinition {
    /// A file-scoped rule in the `general` category
    pub fn new<F>(name: impl Into<String>, severity: Severity, check: F) -> Self
    where
        F: Fn(&RuleContext<'_>) -> anyhow::Result<Vec<Finding>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            severity,
            description: String::new(),
            category: "general".to_string(),
            scope: RuleScope::File,
            check: Arc::new(check),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn scope(mut self, scope: RuleScope) -> Self {
        self.scope = scope;
        self
    }
}

/// Name -> rule, iterated in name order
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: BTreeMap<String, RuleDefinition>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in rules
    pub fn with_builtin() -> Result<Self, GateError> {
        let mut registry = Self::new();
        for rule in builtin::all() {
            registry.register(rule)?;
        }
        Ok(registry)
    }

    /// Add a rule. A name that is already registered is a setup error.
    pub fn register(&mut self, rule: RuleDefinition) -> Result<(), GateError> {
        if self.rules.contains_key(&rule.name) || rule.name == RULE_EXECUTION_ERROR {
            return Err(GateError::DuplicateRuleName(rule.name));
        }
        self.rules.insert(rule.name.clone(), rule);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RuleDefinition> {
        self.rules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &RuleDefinition> {
        self.rules.values()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Everything a check function may look at for one file
pub struct RuleContext<'a> {
    rule: &'a str,
    severity: Severity,
    file: &'a SourceFile,
    ast: &'a SyntaxTree,
    symbols: &'a [Symbol],
    query: Option<&'a QueryEngine<'a>>,
    thresholds: Option<&'a BTreeMap<String, ThresholdValue>>,
}

impl<'a> RuleContext<'a> {
    pub(crate) fn new(
        rule: &'a str,
        severity: Severity,
        file: &'a SourceFile,
        ast: &'a SyntaxTree,
        symbols: &'a [Symbol],
    ) -> Self {
        Self {
            rule,
            severity,
            file,
            ast,
            symbols,
            query: None,
            thresholds: None,
        }
    }

    pub(crate) fn with_query(mut self, query: &'a QueryEngine<'a>) -> Self {
        self.query = Some(query);
        self
    }

    pub(crate) fn with_thresholds(mut self, thresholds: &'a BTreeMap<String, ThresholdValue>) -> Self {
        self.thresholds = Some(thresholds);
        self
    }

    pub fn rule_name(&self) -> &str {
        self.rule
    }

    /// Severity after configuration overrides
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Path, role, LOC, complexity and function inventory
    pub fn file(&self) -> &'a SourceFile {
        self.file
    }

    pub fn ast(&self) -> &'a SyntaxTree {
        self.ast
    }

    /// Top-level symbols declared in this file
    pub fn symbols(&self) -> &'a [Symbol] {
        self.symbols
    }

    /// Preorder walk of the file's tree, dispatching by node kind
    pub fn walk(&self, visitors: &mut Visitors<'_>) {
        self.ast.walk(visitors);
    }

    /// `Some` only for graph-scoped rules
    pub fn graph(&self) -> Option<&'a KnowledgeGraph> {
        self.query.map(|q| q.graph())
    }

    /// `Some` only for graph-scoped rules
    pub fn query(&self) -> Option<&'a QueryEngine<'a>> {
        self.query
    }

    pub fn threshold(&self, key: &str) -> Option<&'a ThresholdValue> {
        self.thresholds.and_then(|t| t.get(key))
    }

    /// Integer threshold, falling back to `default` when unset or not numeric
    pub fn threshold_or(&self, key: &str, default: i64) -> i64 {
        self.threshold(key)
            .and_then(|v| v.as_i64())
            .unwrap_or(default)
    }

    /// A finding for this rule and file at the given position
    pub fn finding(&self, line: u32, column: u32, message: impl Into<String>) -> Finding {
        Finding::new(
            self.rule,
            self.severity,
            self.file.path.as_str(),
            line,
            column,
            message,
        )
    }

    /// A finding located at the start of `node`
    pub fn finding_at(&self, node: Node<'_>, message: impl Into<String>) -> Finding {
        let start = node.start();
        self.finding(start.line, start.column, message)
    }
}
