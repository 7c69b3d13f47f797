//! Size and complexity metrics
//!
//! Cyclomatic complexity is `1 + decision points`, where the decision-point
//! families are toggled by [`ComplexityConfig`]. Nested functions are
//! measured on their own and never add to the function enclosing them.

use crate::config::ComplexityConfig;
use crate::parsers::{LanguageProfile, Node, SyntaxTree};

/// Cyclomatic complexity of one function node
pub fn function_complexity(
    func: Node<'_>,
    profile: &LanguageProfile,
    toggles: &ComplexityConfig,
) -> u32 {
    let mut complexity = 1;
    let mut stack: Vec<Node<'_>> = func.children().collect();

    while let Some(node) = stack.pop() {
        if profile.is_function(node.kind()) {
            continue;
        }
        complexity += decision_weight(node, profile, toggles);
        stack.extend(node.children());
    }

    complexity
}

fn decision_weight(node: Node<'_>, profile: &LanguageProfile, toggles: &ComplexityConfig) -> u32 {
    let kinds = &profile.decisions;
    let kind = node.kind();

    let counted = (toggles.conditionals && kinds.conditionals.contains(&kind))
        || (toggles.ternaries && kinds.ternaries.contains(&kind))
        || (toggles.loops && kinds.loops.contains(&kind))
        || (toggles.switch_cases && kinds.switch_cases.contains(&kind))
        || (toggles.catch_clauses && kinds.catch_clauses.contains(&kind))
        || (toggles.optional_chaining && kinds.optional_chains.contains(&kind));
    if counted {
        return 1;
    }

    if kind == kinds.binary_expression {
        if let Some(op) = node.child_by_field(kinds.operator_field) {
            let op = op.kind();
            if (toggles.logical_operators && kinds.logical_operators.contains(&op))
                || (toggles.nullish_coalescing && kinds.nullish_operators.contains(&op))
            {
                return 1;
            }
        }
    }

    0
}

/// Count lines holding at least one non-comment token
pub fn lines_of_code(tree: &SyntaxTree) -> u32 {
    let profile = tree.profile();
    let mut code_lines = vec![false; tree.line_count() + 1];

    for node in tree.root().descendants().skip(1) {
        if node.children().next().is_some() || profile.is_comment(node.kind()) {
            continue;
        }
        let range = node.byte_range();
        if range.is_empty() {
            continue;
        }
        let start = node.start();
        let end = node.end();
        // a token ending in a newline stops on the previous line
        let last = if end.column == 1 && end.line > start.line {
            end.line - 1
        } else {
            end.line
        };
        for line in start.line..=last {
            if let Some(slot) = code_lines.get_mut(line as usize) {
                *slot = true;
            }
        }
    }

    code_lines.iter().filter(|&&marked| marked).count() as u32
}
