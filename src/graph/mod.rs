//! Knowledge graph of files, symbols and import edges
//!
//! The graph is assembled once, single-threaded, from the per-file
//! records produced by [`builder`], in lexicographic path order so that
//! every derived result is independent of the order files finished
//! parsing. After [`KnowledgeGraph::seal`] returns the graph is read-only.
//!
//! Storage is flat: files, symbols and edges live in vectors and refer
//! to one another by path or index, never by reference.

pub mod builder;
pub mod cycles;
pub mod metrics;
pub mod query;
pub mod resolve;
pub mod roles;

pub use builder::{FileAnalyzer, FileRecord, RawImport};
pub use query::QueryEngine;
pub use resolve::{ModuleResolver, ResolutionStatus};
pub use roles::RoleClassifier;

use crate::config::ResolveConfig;
use crate::error::{Diagnostic, DiagnosticKind};
use crate::models::{FileRole, FunctionRecord, Symbol};
use crate::parsers::SyntaxTree;
use crate::suppression::SuppressionDirective;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, warn};

/// A source file and its derived metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFile {
    /// Project-relative, `/`-separated; the file's identity
    pub path: String,
    pub role: FileRole,
    pub lines_of_code: u32,
    /// Sum of function complexities, at least 1
    pub complexity: u32,
    pub functions: Vec<FunctionRecord>,
}

/// A directed import relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportEdge {
    pub source: String,
    pub specifier: String,
    /// Path of the imported file when resolved
    pub target: Option<String>,
    pub status: ResolutionStatus,
    pub line: u32,
}

/// Syntax tree and directives kept for the rule and suppression phases
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub path: String,
    pub tree: Arc<SyntaxTree>,
    pub directives: Vec<SuppressionDirective>,
}

/// Result of sealing: the graph plus what later phases need from phase 1
pub struct SealedGraph {
    pub graph: KnowledgeGraph,
    /// Parallel to `graph.files()`
    pub parsed: Vec<ParsedFile>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Default)]
pub struct KnowledgeGraph {
    files: Vec<SourceFile>,
    file_index: FxHashMap<String, usize>,
    symbols: Vec<Symbol>,
    /// Symbol ids per file, parallel to `files`
    file_symbols: Vec<Range<usize>>,
    symbol_index: FxHashMap<String, Vec<usize>>,
    edges: Vec<ImportEdge>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
}

impl KnowledgeGraph {
    /// Merge per-file records into a sealed graph. Records may arrive in
    /// any order; duplicates of an already-seen path are dropped.
    pub fn seal(mut records: Vec<FileRecord>, resolve: &ResolveConfig) -> SealedGraph {
        records.sort_by(|a, b| a.file.path.cmp(&b.file.path));
        let before = records.len();
        records.dedup_by(|later, first| later.file.path == first.file.path);
        if records.len() != before {
            warn!("Dropped {} duplicate file records", before - records.len());
        }

        let mut graph = KnowledgeGraph::default();
        let mut parsed = Vec::with_capacity(records.len());
        let mut pending = Vec::with_capacity(records.len());

        for record in records {
            let idx = graph.files.len();
            let path = record.file.path.clone();

            let first_symbol = graph.symbols.len();
            for symbol in record.symbols {
                graph
                    .symbol_index
                    .entry(symbol.name.clone())
                    .or_default()
                    .push(graph.symbols.len());
                graph.symbols.push(symbol);
            }
            graph.file_symbols.push(first_symbol..graph.symbols.len());

            graph.file_index.insert(path.clone(), idx);
            graph.files.push(record.file);
            parsed.push(ParsedFile {
                path: path.clone(),
                tree: record.tree,
                directives: record.directives,
            });
            pending.push((path, record.imports));
        }

        graph.outgoing = vec![Vec::new(); graph.files.len()];
        graph.incoming = vec![Vec::new(); graph.files.len()];

        let mut diagnostics = Vec::new();
        let resolver = ModuleResolver::new(graph.files.iter().map(|f| f.path.as_str()), resolve);
        let mut edges = Vec::new();
        for (source, imports) in pending {
            for import in imports {
                let (status, target) = resolver.resolve(&source, &import.specifier);
                if status == ResolutionStatus::Unresolved {
                    debug!(
                        "Unresolved import '{}' in {}:{}",
                        import.specifier, source, import.line
                    );
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticKind::UnresolvedImport,
                            format!("cannot resolve import '{}'", import.specifier),
                        )
                        .at(source.clone(), Some(import.line)),
                    );
                }
                edges.push(ImportEdge {
                    source: source.clone(),
                    specifier: import.specifier,
                    target,
                    status,
                    line: import.line,
                });
            }
        }

        for (id, edge) in edges.iter().enumerate() {
            if let Some(&src) = graph.file_index.get(&edge.source) {
                graph.outgoing[src].push(id);
            }
            if let Some(&dst) = edge.target.as_ref().and_then(|t| graph.file_index.get(t)) {
                graph.incoming[dst].push(id);
            }
        }
        graph.edges = edges;

        debug!(
            "Sealed graph: {} files, {} symbols, {} edges",
            graph.files.len(),
            graph.symbols.len(),
            graph.edges.len()
        );

        SealedGraph {
            graph,
            parsed,
            diagnostics,
        }
    }

    /// Files in lexicographic path order
    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn file(&self, path: &str) -> Option<&SourceFile> {
        self.file_index.get(path).map(|&i| &self.files[i])
    }

    pub fn file_id(&self, path: &str) -> Option<usize> {
        self.file_index.get(path).copied()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.file_index.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn symbols_in(&self, path: &str) -> &[Symbol] {
        self.file_index
            .get(path)
            .map(|&i| &self.symbols[self.file_symbols[i].clone()])
            .unwrap_or(&[])
    }

    /// All symbols with this name, in file order
    pub fn symbols_named(&self, name: &str) -> impl Iterator<Item = &Symbol> + '_ {
        self.symbol_index
            .get(name)
            .into_iter()
            .flatten()
            .map(move |&i| &self.symbols[i])
    }

    pub fn edges(&self) -> &[ImportEdge] {
        &self.edges
    }

    /// Edges leaving `path`, in source order
    pub fn outgoing(&self, path: &str) -> impl Iterator<Item = &ImportEdge> + '_ {
        self.edge_list(&self.outgoing, path)
    }

    /// Resolved edges arriving at `path`
    pub fn incoming(&self, path: &str) -> impl Iterator<Item = &ImportEdge> + '_ {
        self.edge_list(&self.incoming, path)
    }

    fn edge_list<'g>(
        &'g self,
        lists: &'g [Vec<usize>],
        path: &str,
    ) -> impl Iterator<Item = &'g ImportEdge> + 'g {
        self.file_index
            .get(path)
            .map(|&i| lists[i].as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |&e| &self.edges[e])
    }
}
