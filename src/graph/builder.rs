//! Graph builder, per-file phase
//!
//! Each file is parsed exactly once and reduced to an immutable
//! [`FileRecord`]: role, metrics, function inventory, top-level symbols,
//! raw import specifiers and suppression directives. Records carry no
//! references to one another, so files can be analyzed on any thread and
//! in any order; cross-file resolution happens when the graph is sealed.

use super::metrics::{function_complexity, lines_of_code};
use super::roles::RoleClassifier;
use super::SourceFile;
use crate::config::ComplexityConfig;
use crate::error::FileError;
use crate::models::{FunctionRecord, Symbol, SymbolKind};
use crate::parsers::{LanguageProfile, Node, ParserSet, SyntaxTree};
use crate::suppression::{DirectiveParser, SuppressionDirective};
use rustc_hash::FxHashSet;
use std::sync::Arc;

/// Name given to functions with no name and no binding
pub const ANONYMOUS: &str = "<anonymous>";

/// An import specifier exactly as written, before resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImport {
    pub specifier: String,
    pub line: u32,
}

/// Everything phase 1 learns about one file
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub file: SourceFile,
    pub symbols: Vec<Symbol>,
    pub imports: Vec<RawImport>,
    pub directives: Vec<SuppressionDirective>,
    pub tree: Arc<SyntaxTree>,
}

/// Shared, read-only state for analyzing files in parallel
pub struct FileAnalyzer<'a> {
    parsers: &'a ParserSet,
    roles: &'a RoleClassifier,
    complexity: ComplexityConfig,
    directives: &'a DirectiveParser,
}

impl<'a> FileAnalyzer<'a> {
    pub fn new(
        parsers: &'a ParserSet,
        roles: &'a RoleClassifier,
        complexity: ComplexityConfig,
        directives: &'a DirectiveParser,
    ) -> Self {
        Self {
            parsers,
            roles,
            complexity,
            directives,
        }
    }

    /// Parse and measure one file. A parse failure excludes the file.
    pub fn analyze(&self, path: &str, text: &str) -> Result<FileRecord, FileError> {
        let tree = self
            .parsers
            .parse(text, path)
            .map_err(|e| FileError::parse(path, e))?;
        Ok(self.record(path, tree))
    }

    fn record(&self, path: &str, tree: SyntaxTree) -> FileRecord {
        let profile = tree.profile();

        let functions = extract_functions(&tree, &self.complexity);
        let complexity = functions
            .iter()
            .map(|f| f.complexity)
            .sum::<u32>()
            .max(1);

        let file = SourceFile {
            path: path.to_string(),
            role: self.roles.classify(path),
            lines_of_code: lines_of_code(&tree),
            complexity,
            functions,
        };

        FileRecord {
            symbols: extract_symbols(&tree, path, profile),
            imports: extract_imports(&tree, profile),
            directives: self.directives.parse(&tree),
            file,
            tree: Arc::new(tree),
        }
    }
}

/// Function inventory in source order, nested functions included
pub fn extract_functions(tree: &SyntaxTree, toggles: &ComplexityConfig) -> Vec<FunctionRecord> {
    let profile = tree.profile();
    tree.root()
        .descendants()
        .filter(|n| profile.is_function(n.kind()))
        .map(|n| FunctionRecord {
            name: function_name(n, profile),
            is_async: n.has_child_kind(profile.async_marker),
            complexity: function_complexity(n, profile, toggles),
            line: n.line(),
        })
        .collect()
}

fn function_name(func: Node<'_>, profile: &LanguageProfile) -> String {
    if let Some(name) = func.child_by_field(profile.name_field) {
        return name.text().to_string();
    }

    // `const f = () => ...`, `{ f: function () {} }`, `obj.f = ...`
    func.parent()
        .and_then(|parent| {
            let field = profile
                .binding_parents
                .iter()
                .find(|(kind, _)| *kind == parent.kind())
                .map(|(_, field)| *field)?;
            parent
                .child_by_field(field)
                .filter(|binding| binding.id() != func.id())
        })
        .map(|binding| binding.text().to_string())
        .unwrap_or_else(|| ANONYMOUS.to_string())
}

/// Top-level declarations, with `exported` set from export statements
/// and from `export { a, b }` lists
pub fn extract_symbols(tree: &SyntaxTree, path: &str, profile: &LanguageProfile) -> Vec<Symbol> {
    let mut symbols = Vec::new();
    let mut export_list: FxHashSet<&str> = FxHashSet::default();

    for stmt in tree.root().named_children() {
        if profile.export_kinds.contains(&stmt.kind()) {
            match stmt.child_by_field(profile.declaration_field) {
                Some(decl) => declared_symbols(decl, path, true, profile, &mut symbols),
                None if stmt.child_by_field("source").is_none() => {
                    collect_export_list(stmt, &mut export_list)
                }
                None => {}
            }
        } else {
            declared_symbols(stmt, path, false, profile, &mut symbols);
        }
    }

    for symbol in symbols.iter_mut() {
        if export_list.contains(symbol.name.as_str()) {
            symbol.exported = true;
        }
    }
    symbols
}

fn declared_symbols(
    decl: Node<'_>,
    path: &str,
    exported: bool,
    profile: &LanguageProfile,
    out: &mut Vec<Symbol>,
) {
    if let Some(kind) = profile.declaration_kind(decl.kind()) {
        if let Some(name) = decl.child_by_field(profile.name_field) {
            out.push(Symbol {
                file: path.to_string(),
                name: name.text().to_string(),
                kind,
                exported,
                line: decl.line(),
            });
        }
        return;
    }

    if !profile.variable_declarations.contains(&decl.kind()) {
        return;
    }

    for declarator in decl
        .named_children()
        .filter(|n| n.kind() == profile.variable_declarator)
    {
        let Some(name) = declarator.child_by_field(profile.name_field) else {
            continue;
        };
        // destructuring patterns bind several names; only plain bindings are symbols
        if !is_identifier(name.text()) {
            continue;
        }
        let kind = match declarator.child_by_field(profile.value_field) {
            Some(value) if profile.is_function(value.kind()) => SymbolKind::Function,
            _ => SymbolKind::Variable,
        };
        out.push(Symbol {
            file: path.to_string(),
            name: name.text().to_string(),
            kind,
            exported,
            line: declarator.line(),
        });
    }
}

fn collect_export_list<'t>(stmt: Node<'t>, out: &mut FxHashSet<&'t str>) {
    for node in stmt.descendants() {
        if node.kind() == "export_specifier" {
            if let Some(name) = node.child_by_field("name") {
                out.insert(name.text());
            }
        }
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Static imports, re-exports and literal `require()` / `import()` calls,
/// in source order
pub fn extract_imports(tree: &SyntaxTree, profile: &LanguageProfile) -> Vec<RawImport> {
    let mut imports = Vec::new();

    for node in tree.root().descendants() {
        let kind = node.kind();

        if let Some((_, field)) = profile.import_sources.iter().find(|(k, _)| *k == kind) {
            if let Some(spec) = node.child_by_field(field).and_then(|s| literal(s, profile)) {
                imports.push(spec);
            }
            continue;
        }

        if kind != profile.call_kind {
            continue;
        }
        let is_import_call = node
            .child_by_field(profile.callee_field)
            .map(|callee| profile.import_callees.contains(&callee.text()))
            .unwrap_or(false);
        if !is_import_call {
            continue;
        }
        if let Some(spec) = node
            .child_by_field(profile.arguments_field)
            .and_then(|args| args.named_children().next())
            .and_then(|arg| literal(arg, profile))
        {
            imports.push(spec);
        }
    }

    imports
}

/// A string literal without interpolation, unquoted
fn literal(node: Node<'_>, profile: &LanguageProfile) -> Option<RawImport> {
    if !profile.string_kinds.contains(&node.kind()) {
        return None;
    }
    // template strings with substitutions are not static specifiers
    if node.named_children().any(|c| c.kind() == "template_substitution") {
        return None;
    }
    let specifier = node
        .text()
        .trim_start_matches(['"', '\'', '`'])
        .trim_end_matches(['"', '\'', '`']);
    if specifier.is_empty() {
        return None;
    }
    Some(RawImport {
        specifier: specifier.to_string(),
        line: node.line(),
    })
}
