use super::*;
use crate::parsers::Position;

#[test]
fn test_parse_simple_function() {
    let source = r#"
function hello(name: string): string {
    return `Hello, ${name}!`;
}
"#;
    let tree = TypeScriptAdapter
        .parse(source, "src/hello.ts")
        .expect("should parse simple function");

    assert_eq!(tree.root().kind(), "program");
    let func = tree
        .root()
        .descendants()
        .find(|n| n.kind() == "function_declaration")
        .expect("function node");
    assert_eq!(func.line(), 2);
    assert_eq!(
        func.child_by_field("name").map(|n| n.text()),
        Some("hello")
    );
}

#[test]
fn test_async_marker_is_a_child_token() {
    let source = "async function load() { await fetch('x'); }\n";
    let tree = TypeScriptAdapter
        .parse(source, "load.js")
        .expect("should parse async function");
    let func = tree
        .root()
        .descendants()
        .find(|n| n.kind() == "function_declaration")
        .expect("function node");
    assert!(func.has_child_kind(PROFILE.async_marker));
}

#[test]
fn test_binary_operator_field() {
    let tree = TypeScriptAdapter
        .parse("const ok = a && b;\n", "a.ts")
        .expect("should parse logical expression");
    let binary = tree
        .root()
        .descendants()
        .find(|n| n.kind() == "binary_expression")
        .expect("binary expression");
    let op = binary
        .child_by_field("operator")
        .expect("operator child");
    assert_eq!(op.kind(), "&&");
}

#[test]
fn test_import_source_field() {
    let tree = TypeScriptAdapter
        .parse("import { b } from './b';\n", "a.ts")
        .expect("should parse import");
    let import = tree
        .root()
        .descendants()
        .find(|n| n.kind() == "import_statement")
        .expect("import statement");
    let source = import.child_by_field("source").expect("source field");
    assert_eq!(source.text(), "'./b'");
    assert_eq!(source.start(), Position { line: 1, column: 19 });
}

#[test]
fn test_syntax_error_is_parse_error() {
    let source = "function broken( {\n  return 1;\n";
    let err = TypeScriptAdapter
        .parse(source, "broken.ts")
        .expect_err("broken source must not produce a tree");
    assert!(err.line >= 1);
}

#[test]
fn test_tsx_uses_tsx_grammar() {
    let source = "export const App = () => <div>hi</div>;\n";
    let tree = TypeScriptAdapter
        .parse(source, "App.tsx")
        .expect("should parse tsx");
    assert!(tree
        .root()
        .descendants()
        .any(|n| n.kind() == "arrow_function"));
}

#[test]
fn test_comments_survive_lowering() {
    let source = "// leading\nconst x = 1; /* trailing */\n";
    let tree = TypeScriptAdapter
        .parse(source, "c.ts")
        .expect("should parse comments");
    let comments: Vec<_> = tree
        .root()
        .descendants()
        .filter(|n| n.kind() == "comment")
        .map(|n| (n.line(), n.text()))
        .collect();
    assert_eq!(comments, vec![(1, "// leading"), (2, "/* trailing */")]);
}
