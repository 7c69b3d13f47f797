//! TypeScript/JavaScript parser adapter using tree-sitter
//!
//! Parses `.ts/.tsx/.js/.jsx/.mjs/.cjs` with the tree-sitter grammars and
//! lowers the concrete syntax tree into a [`SyntaxTree`].

use super::{DecisionKinds, LanguageProfile, NodeId, ParserAdapter, SyntaxTree, TreeBuilder};
use crate::error::ParseError;
use crate::models::SymbolKind;
use tree_sitter::{Language, Parser};

/// Kind table shared by the TypeScript, TSX and JavaScript grammars
pub static PROFILE: LanguageProfile = LanguageProfile {
    language: "typescript",
    comment_kinds: &["comment", "hash_bang_line"],
    string_kinds: &["string", "template_string"],
    function_kinds: &[
        "function_declaration",
        "generator_function_declaration",
        "function_expression",
        "generator_function",
        "arrow_function",
        "method_definition",
    ],
    async_marker: "async",
    name_field: "name",
    binding_parents: &[
        ("variable_declarator", "name"),
        ("pair", "key"),
        ("assignment_expression", "left"),
        ("public_field_definition", "name"),
        ("field_definition", "property"),
    ],
    decisions: DecisionKinds {
        conditionals: &["if_statement"],
        ternaries: &["ternary_expression"],
        loops: &[
            "for_statement",
            "for_in_statement",
            "while_statement",
            "do_statement",
        ],
        switch_cases: &["switch_case"],
        catch_clauses: &["catch_clause"],
        binary_expression: "binary_expression",
        operator_field: "operator",
        logical_operators: &["&&", "||"],
        nullish_operators: &["??"],
        optional_chains: &["optional_chain"],
    },
    declarations: &[
        ("function_declaration", SymbolKind::Function),
        ("generator_function_declaration", SymbolKind::Function),
        ("class_declaration", SymbolKind::Class),
        ("abstract_class_declaration", SymbolKind::Class),
        ("interface_declaration", SymbolKind::Type),
        ("type_alias_declaration", SymbolKind::Type),
        ("enum_declaration", SymbolKind::Enum),
    ],
    variable_declarations: &["lexical_declaration", "variable_declaration"],
    variable_declarator: "variable_declarator",
    value_field: "value",
    export_kinds: &["export_statement"],
    declaration_field: "declaration",
    import_sources: &[
        ("import_statement", "source"),
        ("export_statement", "source"),
        ("import_require_clause", "source"),
    ],
    call_kind: "call_expression",
    callee_field: "function",
    arguments_field: "arguments",
    import_callees: &["require", "import"],
};

/// Tree-sitter backed adapter for the TypeScript family
#[derive(Debug, Default, Clone, Copy)]
pub struct TypeScriptAdapter;

impl TypeScriptAdapter {
    fn language_for(path: &str) -> Language {
        let ext = path.rsplit('.').next().unwrap_or("");
        match ext {
            "ts" | "mts" | "cts" => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            "tsx" => tree_sitter_typescript::LANGUAGE_TSX.into(),
            "js" | "jsx" | "mjs" | "cjs" => tree_sitter_javascript::LANGUAGE.into(),
            _ => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        }
    }
}

impl ParserAdapter for TypeScriptAdapter {
    fn name(&self) -> &'static str {
        "tree-sitter-typescript"
    }

    fn extensions(&self) -> &[&'static str] {
        &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"]
    }

    fn parse(&self, source: &str, path: &str) -> Result<SyntaxTree, ParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(&Self::language_for(path))
            .map_err(|e| ParseError::new(1, 1, format!("failed to load grammar: {}", e)))?;

        let ts_tree = parser
            .parse(source, None)
            .ok_or_else(|| ParseError::new(1, 1, "parser produced no tree"))?;

        let tree = lower(&ts_tree, source);
        if let Some(bad) = tree.first_error() {
            let start = bad.start();
            let message = if bad.kind() == "ERROR" {
                let snippet: String = bad.text().chars().take(24).collect();
                format!("unexpected `{}`", snippet.lines().next().unwrap_or(""))
            } else {
                format!("missing `{}`", bad.kind())
            };
            return Err(ParseError::new(start.line, start.column, message));
        }
        Ok(tree)
    }
}

/// Copy a tree-sitter tree into the arena with a single cursor pass
fn lower(ts_tree: &tree_sitter::Tree, source: &str) -> SyntaxTree {
    let mut builder = TreeBuilder::new(source, &PROFILE);
    let mut cursor = ts_tree.walk();
    let mut parents: Vec<NodeId> = Vec::new();

    loop {
        let node = cursor.node();
        let id = builder.add_node(
            parents.last().copied(),
            node.kind(),
            cursor.field_name(),
            node.is_named(),
            node.start_byte()..node.end_byte(),
            node.is_error() || node.is_missing(),
        );

        if cursor.goto_first_child() {
            parents.push(id);
            continue;
        }

        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return builder.finish();
            }
            parents.pop();
        }
    }
}

#[cfg(test)]
mod tests;
