//! Import cycle detection
//!
//! 1. Collapse resolved import edges into a simple file-level digraph
//! 2. Run Tarjan's SCC algorithm (O(V+E))
//! 3. For every SCC of size > 1, or a file importing itself, walk a
//!    depth-first path from its smallest member back to itself
//!
//! File ids follow the graph's lexicographic path order, so "smallest id"
//! is "smallest path" and sorted adjacency lists make the walk
//! reproducible.

use super::KnowledgeGraph;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

/// One representative cycle per non-trivial SCC, each starting at its
/// lexicographically smallest path, sorted.
pub fn find_cycles(graph: &KnowledgeGraph) -> Vec<Vec<String>> {
    let adjacency = adjacency(graph);

    let mut digraph: DiGraph<(), ()> = DiGraph::with_capacity(adjacency.len(), 0);
    let nodes: Vec<NodeIndex> = (0..adjacency.len()).map(|_| digraph.add_node(())).collect();
    for (src, targets) in adjacency.iter().enumerate() {
        for &dst in targets {
            digraph.add_edge(nodes[src], nodes[dst], ());
        }
    }

    let mut in_component = vec![false; adjacency.len()];
    let mut visited = vec![false; adjacency.len()];
    let files = graph.files();

    let mut cycles: Vec<Vec<String>> = tarjan_scc(&digraph)
        .into_iter()
        .filter(|scc| {
            scc.len() > 1 || scc.iter().any(|n| adjacency[n.index()].contains(&n.index()))
        })
        .filter_map(|scc| {
            let members: Vec<usize> = scc.iter().map(|n| n.index()).collect();
            for &m in &members {
                in_component[m] = true;
            }
            let start = members.iter().copied().min()?;
            let path = walk_back_to(start, &adjacency, &in_component, &mut visited);
            for &m in &members {
                in_component[m] = false;
            }
            path.map(|ids| ids.into_iter().map(|i| files[i].path.clone()).collect())
        })
        .collect();

    cycles.sort();
    cycles
}

/// Sorted, de-duplicated successor lists over resolved edges
fn adjacency(graph: &KnowledgeGraph) -> Vec<Vec<usize>> {
    let mut adjacency = vec![Vec::new(); graph.len()];
    for edge in graph.edges() {
        let src = graph.file_id(&edge.source);
        let dst = edge.target.as_deref().and_then(|t| graph.file_id(t));
        if let (Some(src), Some(dst)) = (src, dst) {
            adjacency[src].push(dst);
        }
    }
    for targets in adjacency.iter_mut() {
        targets.sort_unstable();
        targets.dedup();
    }
    adjacency
}

/// Iterative DFS restricted to one SCC. Each member is entered at most
/// once and each of its edges scanned at most once.
fn walk_back_to(
    start: usize,
    adjacency: &[Vec<usize>],
    in_component: &[bool],
    visited: &mut [bool],
) -> Option<Vec<usize>> {
    let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
    visited[start] = true;

    while let Some(top) = stack.last_mut() {
        let (node, next) = *top;
        let Some(&succ) = adjacency[node].get(next) else {
            stack.pop();
            continue;
        };
        top.1 += 1;

        if succ == start {
            return Some(stack.iter().map(|&(n, _)| n).collect());
        }
        if in_component[succ] && !visited[succ] {
            visited[succ] = true;
            stack.push((succ, 0));
        }
    }
    None
}
