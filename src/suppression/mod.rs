//! Inline suppression directives
//!
//! Supports, inside any comment, with the configured prefix (default
//! `graphgate-`):
//! - `graphgate-disable-next-line RULE[, RULE...]` - suppress the named
//!   rules (all rules if none named) on the following line only
//! - `graphgate-disable RULE [-- reason]` - suppress from this line until a
//!   matching `enable`, or to the end of the file
//! - `graphgate-enable RULE` - close the most recent open `disable` region
//!   for that rule
//!
//! Directives are collected per file during parsing and turned into a
//! [`FileSuppressions`] table in one linear pass.

use crate::error::{Diagnostic, DiagnosticKind};
use crate::models::Finding;
use crate::parsers::SyntaxTree;
use regex::Regex;
use rustc_hash::FxHashMap;
use std::sync::OnceLock;
use tracing::warn;

/// Explicit spelling of "all rules"
pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    DisableNextLine,
    Disable,
    Enable,
}

/// One directive found in a comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuppressionDirective {
    pub kind: DirectiveKind,
    /// Named rules; empty means every rule
    pub rules: Vec<String>,
    pub line: u32,
    pub reason: Option<String>,
}

impl SuppressionDirective {
    pub fn is_wildcard(&self) -> bool {
        self.rules.is_empty()
    }
}

fn directive_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(disable-next-line|disable|enable)(?:\s+(.*?))?\s*$").expect("valid regex")
    })
}

/// Extracts directives from comment nodes
#[derive(Debug, Clone)]
pub struct DirectiveParser {
    prefix: String,
}

impl Default for DirectiveParser {
    fn default() -> Self {
        Self::new("graphgate-")
    }
}

impl DirectiveParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Directives from every comment in the tree, in document order
    pub fn parse(&self, tree: &SyntaxTree) -> Vec<SuppressionDirective> {
        let profile = tree.profile();
        tree.root()
            .descendants()
            .filter(|n| profile.is_comment(n.kind()))
            .flat_map(|n| self.parse_comment(n.text(), n.line()))
            .collect()
    }

    /// Parse raw comment text starting on `first_line`. Block comments may
    /// carry one directive per line.
    pub fn parse_comment(&self, text: &str, first_line: u32) -> Vec<SuppressionDirective> {
        strip_delimiters(text)
            .lines()
            .enumerate()
            .filter_map(|(offset, line)| self.parse_line(line, first_line + offset as u32))
            .collect()
    }

    fn parse_line(&self, line: &str, line_no: u32) -> Option<SuppressionDirective> {
        let body = line.trim().trim_start_matches('*').trim_start();
        let body = body.strip_prefix(self.prefix.as_str())?;
        let caps = directive_pattern().captures(body)?;

        let kind = match caps.get(1)?.as_str() {
            "disable-next-line" => DirectiveKind::DisableNextLine,
            "disable" => DirectiveKind::Disable,
            _ => DirectiveKind::Enable,
        };

        let rest = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        let (names, reason) = match rest.split_once("--") {
            Some((names, reason)) => (names, Some(reason.trim())),
            None => (rest, None),
        };

        let mut rules: Vec<String> = names
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();
        if rules.iter().any(|r| r == WILDCARD) {
            rules.clear();
        }

        Some(SuppressionDirective {
            kind,
            rules,
            line: line_no,
            reason: reason.filter(|r| !r.is_empty()).map(|r| r.to_string()),
        })
    }
}

fn strip_delimiters(text: &str) -> &str {
    let text = text.trim();
    if let Some(body) = text.strip_prefix("/*") {
        return body.strip_suffix("*/").unwrap_or(body);
    }
    if let Some(body) = text.strip_prefix("<!--") {
        return body.strip_suffix("-->").unwrap_or(body);
    }
    text.strip_prefix("//")
        .or_else(|| text.strip_prefix('#'))
        .unwrap_or(text)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Key {
    All,
    Rule(String),
}

impl Key {
    fn matches(&self, rule: &str) -> bool {
        match self {
            Key::All => true,
            Key::Rule(name) => name == rule,
        }
    }

    fn of(directive: &SuppressionDirective) -> Vec<Key> {
        if directive.is_wildcard() {
            vec![Key::All]
        } else {
            directive.rules.iter().cloned().map(Key::Rule).collect()
        }
    }
}

#[derive(Debug, Clone)]
struct Region {
    key: Key,
    start: u32,
    /// Line of the closing `enable`; the region stops just before it
    end: Option<u32>,
}

impl Region {
    fn covers(&self, line: u32) -> bool {
        self.start <= line && self.end.map_or(true, |end| line < end)
    }
}

/// Suppression state for one file
#[derive(Debug, Clone, Default)]
pub struct FileSuppressions {
    next_line: FxHashMap<u32, Vec<Key>>,
    regions: Vec<Region>,
}

impl FileSuppressions {
    pub fn build(directives: &[SuppressionDirective]) -> Self {
        let mut ordered: Vec<&SuppressionDirective> = directives.iter().collect();
        ordered.sort_by_key(|d| d.line);

        let mut table = FileSuppressions::default();
        let mut open: FxHashMap<Key, Vec<usize>> = FxHashMap::default();

        for directive in ordered {
            match directive.kind {
                DirectiveKind::DisableNextLine => {
                    table
                        .next_line
                        .entry(directive.line + 1)
                        .or_default()
                        .extend(Key::of(directive));
                }
                DirectiveKind::Disable => {
                    for key in Key::of(directive) {
                        open.entry(key.clone()).or_default().push(table.regions.len());
                        table.regions.push(Region {
                            key,
                            start: directive.line,
                            end: None,
                        });
                    }
                }
                DirectiveKind::Enable => {
                    for key in Key::of(directive) {
                        // an enable with nothing open is ignored
                        if let Some(idx) = open.get_mut(&key).and_then(|stack| stack.pop()) {
                            table.regions[idx].end = Some(directive.line);
                        }
                    }
                }
            }
        }

        table
    }

    pub fn is_empty(&self) -> bool {
        self.next_line.is_empty() && self.regions.is_empty()
    }

    pub fn is_suppressed(&self, rule: &str, line: u32) -> bool {
        let by_next_line = self
            .next_line
            .get(&line)
            .is_some_and(|keys| keys.iter().any(|k| k.matches(rule)));
        by_next_line
            || self
                .regions
                .iter()
                .any(|r| r.key.matches(rule) && r.covers(line))
    }
}

/// Suppression tables for every analyzed file
#[derive(Debug, Default)]
pub struct SuppressionEngine {
    files: FxHashMap<String, FileSuppressions>,
}

impl SuppressionEngine {
    pub fn new<'a>(files: impl IntoIterator<Item = (&'a str, &'a [SuppressionDirective])>) -> Self {
        let files = files
            .into_iter()
            .filter(|(_, directives)| !directives.is_empty())
            .map(|(path, directives)| (path.to_string(), FileSuppressions::build(directives)))
            .collect();
        Self { files }
    }

    pub fn is_suppressed(&self, finding: &Finding) -> bool {
        self.files
            .get(&finding.file)
            .is_some_and(|table| table.is_suppressed(&finding.rule, finding.line))
    }

    /// Drop suppressed findings, keeping the order of the rest.
    /// Returns the survivors and the number removed.
    pub fn filter(&self, findings: Vec<Finding>) -> (Vec<Finding>, usize) {
        let before = findings.len();
        let kept: Vec<Finding> = findings
            .into_iter()
            .filter(|f| !self.is_suppressed(f))
            .collect();
        let removed = before - kept.len();
        (kept, removed)
    }
}

/// Diagnostics for `disable` directives naming rules that are not registered
pub fn dead_suppressions(
    path: &str,
    directives: &[SuppressionDirective],
    is_known: impl Fn(&str) -> bool,
) -> Vec<Diagnostic> {
    directives
        .iter()
        .filter(|d| d.kind != DirectiveKind::Enable)
        .flat_map(|d| d.rules.iter().map(move |rule| (d, rule)))
        .filter(|(_, rule)| !is_known(rule))
        .map(|(d, rule)| {
            warn!(
                "{}:{}: suppression names unknown rule '{}'",
                path, d.line, rule
            );
            Diagnostic::new(
                DiagnosticKind::DeadSuppression,
                format!("suppression names unknown rule '{}'", rule),
            )
            .at(path, Some(d.line))
        })
        .collect()
}
