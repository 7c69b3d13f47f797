//! Empty catch block rule
//!
//! A catch body with no statements swallows the error. A body holding
//! only a comment counts as intentional and is not reported.

use crate::models::Severity;
use crate::parsers::Visitors;
use crate::rules::RuleDefinition;
use std::cell::RefCell;

pub const NAME: &str = "empty-catch";

pub fn empty_catch() -> RuleDefinition {
    RuleDefinition::new(NAME, Severity::Warning, |ctx| {
        let findings = RefCell::new(Vec::new());
        let mut visitors = Visitors::new();

        for kind in ctx.ast().profile().decisions.catch_clauses {
            visitors = visitors.on(kind, |node| {
                let Some(body) = node.child_by_field("body") else {
                    return;
                };
                if body.named_children().next().is_none() {
                    findings.borrow_mut().push(
                        ctx.finding_at(node, "Empty catch block swallows errors")
                            .with_suggestion("Handle the error or leave a comment saying why it is ignored"),
                    );
                }
            });
        }

        ctx.walk(&mut visitors);
        drop(visitors);
        Ok(findings.into_inner())
    })
    .description("Catch blocks that silently discard errors")
    .category("error-handling")
}
