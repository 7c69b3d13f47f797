//! Parser adapters
//!
//! The analysis core only ever sees a [`SyntaxTree`]: a kind-tagged arena
//! plus a [`LanguageProfile`] naming which kinds mean "function",
//! "decision point", "import" and so on. Adapters own everything
//! language-specific; the tree-sitter TypeScript/JavaScript adapter is the
//! one shipped by default.

mod tree;
pub mod typescript;

pub use tree::{LineIndex, Node, NodeId, Position, SyntaxTree, TreeBuilder, Visitors};

use crate::error::ParseError;
use crate::models::SymbolKind;
use std::sync::Arc;

/// Contract implemented by every parser backend
pub trait ParserAdapter: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// File extensions (without the leading dot) this adapter handles
    fn extensions(&self) -> &[&'static str];

    /// Parse `source` into a syntax tree. A tree with syntax errors must be
    /// reported as a `ParseError`, never returned.
    fn parse(&self, source: &str, path: &str) -> Result<SyntaxTree, ParseError>;
}

/// Node kinds that count as decision points, grouped by toggle
#[derive(Debug)]
pub struct DecisionKinds {
    pub conditionals: &'static [&'static str],
    pub ternaries: &'static [&'static str],
    pub loops: &'static [&'static str],
    pub switch_cases: &'static [&'static str],
    pub catch_clauses: &'static [&'static str],
    /// Binary expression kind carrying an operator child
    pub binary_expression: &'static str,
    pub operator_field: &'static str,
    pub logical_operators: &'static [&'static str],
    pub nullish_operators: &'static [&'static str],
    pub optional_chains: &'static [&'static str],
}

/// Kind table an adapter hands to the graph builder
#[derive(Debug)]
pub struct LanguageProfile {
    pub language: &'static str,
    pub comment_kinds: &'static [&'static str],
    pub string_kinds: &'static [&'static str],
    pub function_kinds: &'static [&'static str],
    /// Unnamed child token marking an asynchronous function
    pub async_marker: &'static str,
    pub name_field: &'static str,
    /// (parent kind, field) pairs that give an anonymous function its binding name
    pub binding_parents: &'static [(&'static str, &'static str)],
    pub decisions: DecisionKinds,
    /// Top-level declaration kinds and the symbol kind they produce
    pub declarations: &'static [(&'static str, SymbolKind)],
    pub variable_declarations: &'static [&'static str],
    pub variable_declarator: &'static str,
    pub value_field: &'static str,
    pub export_kinds: &'static [&'static str],
    pub declaration_field: &'static str,
    /// (statement kind, field holding the module specifier)
    pub import_sources: &'static [(&'static str, &'static str)],
    pub call_kind: &'static str,
    pub callee_field: &'static str,
    pub arguments_field: &'static str,
    /// Callee names whose first string argument is a module specifier
    pub import_callees: &'static [&'static str],
}

impl LanguageProfile {
    pub fn is_comment(&self, kind: &str) -> bool {
        self.comment_kinds.contains(&kind)
    }

    pub fn is_function(&self, kind: &str) -> bool {
        self.function_kinds.contains(&kind)
    }

    pub fn declaration_kind(&self, kind: &str) -> Option<SymbolKind> {
        self.declarations
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, s)| *s)
    }
}

/// Routes files to adapters by extension
#[derive(Clone)]
pub struct ParserSet {
    adapters: Vec<Arc<dyn ParserAdapter>>,
}

impl Default for ParserSet {
    fn default() -> Self {
        Self::new().with_adapter(Arc::new(typescript::TypeScriptAdapter))
    }
}

impl ParserSet {
    /// An empty set; see `Default` for the built-in adapters
    pub fn new() -> Self {
        Self {
            adapters: Vec::new(),
        }
    }

    /// Later adapters take precedence for shared extensions
    pub fn with_adapter(mut self, adapter: Arc<dyn ParserAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    pub fn adapter_for(&self, path: &str) -> Option<&dyn ParserAdapter> {
        let ext = extension_of(path)?;
        self.adapters
            .iter()
            .rev()
            .find(|a| a.extensions().contains(&ext))
            .map(|a| a.as_ref())
    }

    pub fn supports(&self, path: &str) -> bool {
        self.adapter_for(path).is_some()
    }

    pub fn extensions(&self) -> Vec<&'static str> {
        let mut exts: Vec<_> = self
            .adapters
            .iter()
            .flat_map(|a| a.extensions().iter().copied())
            .collect();
        exts.sort_unstable();
        exts.dedup();
        exts
    }

    pub fn parse(&self, source: &str, path: &str) -> Result<SyntaxTree, ParseError> {
        match self.adapter_for(path) {
            Some(adapter) => adapter.parse(source, path),
            None => Err(ParseError::new(
                1,
                1,
                format!("no parser registered for '{}'", path),
            )),
        }
    }
}

fn extension_of(path: &str) -> Option<&str> {
    let file_name = path.rsplit('/').next()?;
    let (_, ext) = file_name.rsplit_once('.')?;
    Some(ext)
}
