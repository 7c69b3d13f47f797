//! Language-neutral syntax tree
//!
//! Parser adapters lower their native trees into this flat arena. Nodes are
//! addressed by index and only expose a kind tag, an optional field name,
//! their byte range and their children, so nothing downstream depends on a
//! particular parser library.

use super::LanguageProfile;
use rustc_hash::FxHashMap;
use std::ops::Range;

/// 1-indexed line/column position (column counted in bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

/// Maps byte offsets to 1-indexed line/column pairs
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            line_starts,
            len: source.len(),
        }
    }

    /// Offsets past the end of the source clamp to the final position.
    pub fn line_and_column(&self, offset: usize) -> Position {
        let offset = offset.min(self.len);
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let start = self.line_starts[line - 1];
        Position {
            line: line as u32,
            column: (offset - start) as u32 + 1,
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

#[derive(Debug, Clone)]
struct NodeData {
    kind: &'static str,
    field: Option<&'static str>,
    named: bool,
    error: bool,
    bytes: Range<usize>,
    start: Position,
    end: Position,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A parsed file: source text plus an arena of nodes (root at index 0)
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: String,
    nodes: Vec<NodeData>,
    lines: LineIndex,
    profile: &'static LanguageProfile,
}

impl SyntaxTree {
    pub fn root(&self) -> Node<'_> {
        Node {
            tree: self,
            id: NodeId(0),
        }
    }

    pub fn node(&self, id: NodeId) -> Node<'_> {
        Node { tree: self, id }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn profile(&self) -> &'static LanguageProfile {
        self.profile
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn line_and_column(&self, offset: usize) -> Position {
        self.lines.line_and_column(offset)
    }

    pub fn line_count(&self) -> usize {
        self.lines.line_count()
    }

    /// First error or missing node in document order
    pub fn first_error(&self) -> Option<Node<'_>> {
        self.nodes
            .iter()
            .position(|n| n.error)
            .map(|i| self.node(NodeId(i as u32)))
    }

    /// Preorder walk from the root, dispatching to visitors by node kind
    pub fn walk(&self, visitors: &mut Visitors<'_>) {
        self.root().walk(visitors);
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0 as usize]
    }
}

/// Incremental constructor used by parser adapters
pub struct TreeBuilder {
    tree: SyntaxTree,
}

impl TreeBuilder {
    pub fn new(source: &str, profile: &'static LanguageProfile) -> Self {
        Self {
            tree: SyntaxTree {
                source: source.to_string(),
                nodes: Vec::new(),
                lines: LineIndex::new(source),
                profile,
            },
        }
    }

    /// Append a node. The first node added becomes the root; every later
    /// node must name an already-added parent.
    pub fn add_node(
        &mut self,
        parent: Option<NodeId>,
        kind: &'static str,
        field: Option<&'static str>,
        named: bool,
        bytes: Range<usize>,
        error: bool,
    ) -> NodeId {
        let id = NodeId(self.tree.nodes.len() as u32);
        let start = self.tree.lines.line_and_column(bytes.start);
        let end = self.tree.lines.line_and_column(bytes.end);
        self.tree.nodes.push(NodeData {
            kind,
            field,
            named,
            error,
            bytes,
            start,
            end,
            parent,
            children: Vec::new(),
        });
        if let Some(p) = parent {
            self.tree.nodes[p.0 as usize].children.push(id);
        }
        id
    }

    pub fn finish(self) -> SyntaxTree {
        self.tree
    }
}

/// Borrowed handle to one node of a [`SyntaxTree`]
#[derive(Clone, Copy)]
pub struct Node<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

impl std::fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let d = self.data();
        write!(f, "{}@{}:{}", d.kind, d.start.line, d.start.column)
    }
}

impl<'t> Node<'t> {
    fn data(&self) -> &'t NodeData {
        self.tree.data(self.id)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> &'static str {
        self.data().kind
    }

    /// Field name this node occupies in its parent, if any
    pub fn field(&self) -> Option<&'static str> {
        self.data().field
    }

    pub fn is_named(&self) -> bool {
        self.data().named
    }

    pub fn is_error(&self) -> bool {
        self.data().error
    }

    pub fn byte_range(&self) -> Range<usize> {
        self.data().bytes.clone()
    }

    pub fn text(&self) -> &'t str {
        self.tree.source.get(self.data().bytes.clone()).unwrap_or("")
    }

    pub fn start(&self) -> Position {
        self.data().start
    }

    pub fn end(&self) -> Position {
        self.data().end
    }

    pub fn line(&self) -> u32 {
        self.data().start.line
    }

    pub fn parent(&self) -> Option<Node<'t>> {
        self.data().parent.map(|id| self.tree.node(id))
    }

    pub fn children(&self) -> impl Iterator<Item = Node<'t>> + 't {
        let tree = self.tree;
        self.data().children.iter().map(move |&id| tree.node(id))
    }

    pub fn named_children(&self) -> impl Iterator<Item = Node<'t>> + 't {
        self.children().filter(|c| c.is_named())
    }

    pub fn child_by_field(&self, field: &str) -> Option<Node<'t>> {
        self.children().find(|c| c.field() == Some(field))
    }

    pub fn has_child_kind(&self, kind: &str) -> bool {
        self.children().any(|c| c.kind() == kind)
    }

    /// Preorder iterator over this node and all of its descendants
    pub fn descendants(&self) -> Descendants<'t> {
        Descendants {
            tree: self.tree,
            stack: vec![self.id],
        }
    }

    pub fn walk(&self, visitors: &mut Visitors<'_>) {
        if visitors.handlers.is_empty() {
            return;
        }
        for node in self.descendants() {
            if let Some(handlers) = visitors.handlers.get_mut(node.kind()) {
                for handler in handlers.iter_mut() {
                    handler(node);
                }
            }
        }
    }
}

pub struct Descendants<'t> {
    tree: &'t SyntaxTree,
    stack: Vec<NodeId>,
}

impl<'t> Iterator for Descendants<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let data = self.tree.data(id);
        self.stack.extend(data.children.iter().rev().copied());
        Some(self.tree.node(id))
    }
}

pub type VisitFn<'v> = Box<dyn for<'t> FnMut(Node<'t>) + 'v>;

/// Visitor callbacks keyed by node kind
#[derive(Default)]
pub struct Visitors<'v> {
    handlers: FxHashMap<&'v str, Vec<VisitFn<'v>>>,
}

impl<'v> Visitors<'v> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for every node of `kind`. Several callbacks may
    /// share a kind; they run in registration order.
    pub fn on<F>(mut self, kind: &'v str, visit: F) -> Self
    where
        F: for<'t> FnMut(Node<'t>) + 'v,
    {
        self.handlers.entry(kind).or_default().push(Box::new(visit));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::typescript::PROFILE;

    fn sample_tree() -> SyntaxTree {
        // program
        //   call "f(a)"
        //     identifier "f"   (field: function)
        //     identifier "a"
        let source = "f(a)\n";
        let mut b = TreeBuilder::new(source, &PROFILE);
        let root = b.add_node(None, "program", None, true, 0..5, false);
        let call = b.add_node(Some(root), "call", None, true, 0..4, false);
        b.add_node(Some(call), "identifier", Some("function"), true, 0..1, false);
        b.add_node(Some(call), "(", None, false, 1..2, false);
        b.add_node(Some(call), "identifier", None, true, 2..3, false);
        b.add_node(Some(call), ")", None, false, 3..4, false);
        b.finish()
    }

    #[test]
    fn test_line_index_positions() {
        let idx = LineIndex::new("ab\ncd\n\nx");
        assert_eq!(idx.line_and_column(0), Position { line: 1, column: 1 });
        assert_eq!(idx.line_and_column(3), Position { line: 2, column: 1 });
        assert_eq!(idx.line_and_column(4), Position { line: 2, column: 2 });
        assert_eq!(idx.line_and_column(6), Position { line: 3, column: 1 });
        assert_eq!(idx.line_and_column(7), Position { line: 4, column: 1 });
        assert_eq!(idx.line_and_column(999), Position { line: 4, column: 2 });
        assert_eq!(idx.line_count(), 4);
    }

    #[test]
    fn test_node_navigation() {
        let tree = sample_tree();
        let call = tree.root().children().next().expect("call node");
        assert_eq!(call.kind(), "call");
        assert_eq!(call.text(), "f(a)");
        let callee = call.child_by_field("function").expect("callee");
        assert_eq!(callee.text(), "f");
        assert_eq!(callee.parent().map(|p| p.kind()), Some("call"));
        assert_eq!(call.named_children().count(), 2);
        assert!(tree.first_error().is_none());
    }

    #[test]
    fn test_descendants_preorder() {
        let tree = sample_tree();
        let kinds: Vec<_> = tree.root().descendants().map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            vec!["program", "call", "identifier", "(", "identifier", ")"]
        );
    }

    #[test]
    fn test_walk_dispatches_by_kind() {
        let tree = sample_tree();
        let mut idents = Vec::new();
        let mut calls = 0;
        tree.walk(
            &mut Visitors::new()
                .on("identifier", |n| idents.push(n.text().to_string()))
                .on("call", |_| calls += 1),
        );
        assert_eq!(idents, vec!["f", "a"]);
        assert_eq!(calls, 1);
    }
}
