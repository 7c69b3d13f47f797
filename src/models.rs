//! Core data models for graphgate
//!
//! These models are shared by the graph builder, the rule engine and the
//! blocking policy: severities, findings, file roles and the per-file
//! records that end up in the knowledge graph.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// Severity levels for findings, totally ordered with `Critical` highest
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// All severities, highest first
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::Error,
        Severity::Warning,
        Severity::Info,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            "critical" => Ok(Severity::Critical),
            other => Err(format!(
                "unknown severity '{}' (expected critical, error, warning or info)",
                other
            )),
        }
    }
}

/// Structural role of a source file
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum FileRole {
    Controller,
    Service,
    Repository,
    Test,
    Config,
    #[default]
    Unknown,
}

impl std::fmt::Display for FileRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FileRole::Controller => "controller",
            FileRole::Service => "service",
            FileRole::Repository => "repository",
            FileRole::Test => "test",
            FileRole::Config => "config",
            FileRole::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A function (or method, or closure) found in a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub name: String,
    pub is_async: bool,
    pub complexity: u32,
    /// 1-indexed start line
    pub line: u32,
}

/// Kinds of top-level symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Class,
    Variable,
    Type,
    Enum,
}

/// A named top-level declaration, identified by (file, name)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub file: String,
    pub name: String,
    pub kind: SymbolKind,
    pub exported: bool,
    pub line: u32,
}

/// A single issue reported by a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub rule: String,
    pub severity: Severity,
    pub file: String,
    /// 1-indexed
    pub line: u32,
    /// 1-indexed
    pub column: u32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Finding {
    pub fn new(
        rule: impl Into<String>,
        severity: Severity,
        file: impl Into<String>,
        line: u32,
        column: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule: rule.into(),
            severity,
            file: file.into(),
            line: line.max(1),
            column: column.max(1),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Canonical ordering: file, line, rule, then column and message so
    /// that parallel collection always sorts to the same sequence.
    pub fn canonical_cmp(&self, other: &Finding) -> Ordering {
        self.file
            .cmp(&other.file)
            .then(self.line.cmp(&other.line))
            .then_with(|| self.rule.cmp(&other.rule))
            .then(self.column.cmp(&other.column))
            .then_with(|| self.message.cmp(&other.message))
            .then(self.severity.cmp(&other.severity))
    }
}
