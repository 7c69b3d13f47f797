//! Read-only queries over a sealed [`KnowledgeGraph`]
//!
//! A `QueryEngine` is shared by reference between whole-graph rules
//! running on different threads. Cycle detection runs at most once per
//! engine and is cached.

use super::cycles::find_cycles;
use super::{KnowledgeGraph, SourceFile};
use crate::models::{FileRole, FunctionRecord, Symbol};
use std::sync::OnceLock;

pub struct QueryEngine<'g> {
    graph: &'g KnowledgeGraph,
    cycles: OnceLock<Vec<Vec<String>>>,
}

impl<'g> QueryEngine<'g> {
    pub fn new(graph: &'g KnowledgeGraph) -> Self {
        Self {
            graph,
            cycles: OnceLock::new(),
        }
    }

    pub fn graph(&self) -> &'g KnowledgeGraph {
        self.graph
    }

    /// Elementary import cycles, one per strongly connected component.
    /// Each cycle starts at its smallest path; the closing edge back to
    /// the first element is implicit.
    pub fn find_circular_deps(&self) -> &[Vec<String>] {
        self.cycles.get_or_init(|| find_cycles(self.graph))
    }

    pub fn cycles_through(&self, path: &str) -> Vec<&[String]> {
        self.find_circular_deps()
            .iter()
            .filter(|c| c.iter().any(|p| p == path))
            .map(|c| c.as_slice())
            .collect()
    }

    /// Highest complexity first; ties broken by path
    pub fn most_complex_files(&self, limit: usize) -> Vec<&'g SourceFile> {
        let mut files: Vec<_> = self.graph.files().iter().collect();
        files.sort_by(|a, b| b.complexity.cmp(&a.complexity).then(a.path.cmp(&b.path)));
        files.truncate(limit);
        files
    }

    /// Highest complexity first; ties broken by path, then line
    pub fn most_complex_functions(&self, limit: usize) -> Vec<(&'g SourceFile, &'g FunctionRecord)> {
        let mut functions: Vec<_> = self
            .graph
            .files()
            .iter()
            .flat_map(|f| f.functions.iter().map(move |func| (f, func)))
            .collect();
        functions.sort_by(|(fa, a), (fb, b)| {
            b.complexity
                .cmp(&a.complexity)
                .then(fa.path.cmp(&fb.path))
                .then(a.line.cmp(&b.line))
        });
        functions.truncate(limit);
        functions
    }

    /// Every top-level symbol with this name, in file order
    pub fn find_symbol(&self, name: &str) -> Vec<&'g Symbol> {
        self.graph.symbols_named(name).collect()
    }

    /// Look up a symbol by its identity
    pub fn symbol(&self, file: &str, name: &str) -> Option<&'g Symbol> {
        self.graph.symbols_in(file).iter().find(|s| s.name == name)
    }

    pub fn exported_symbols(&self, file: &str) -> Vec<&'g Symbol> {
        self.graph
            .symbols_in(file)
            .iter()
            .filter(|s| s.exported)
            .collect()
    }

    /// Files importing `path`, sorted and unique
    pub fn importers(&self, path: &str) -> Vec<&'g str> {
        let mut sources: Vec<&str> = self.graph.incoming(path).map(|e| e.source.as_str()).collect();
        sources.sort_unstable();
        sources.dedup();
        sources
    }

    /// Project files imported by `path`, sorted and unique
    pub fn imports_of(&self, path: &str) -> Vec<&'g str> {
        let mut targets: Vec<&str> = self
            .graph
            .outgoing(path)
            .filter_map(|e| e.target.as_deref())
            .collect();
        targets.sort_unstable();
        targets.dedup();
        targets
    }

    pub fn files_with_role(&self, role: FileRole) -> Vec<&'g SourceFile> {
        self.graph.files().iter().filter(|f| f.role == role).collect()
    }
}
