//! Layer violation rule: controllers must reach repositories through a
//! service, never import them directly

use crate::models::{FileRole, Severity};
use crate::rules::{RuleDefinition, RuleScope};

pub const NAME: &str = "layer-violation";

pub fn layer_violation() -> RuleDefinition {
    RuleDefinition::new(NAME, Severity::Warning, |ctx| {
        let Some(graph) = ctx.graph() else {
            return Ok(Vec::new());
        };
        let file = ctx.file();
        if file.role != FileRole::Controller {
            return Ok(Vec::new());
        }

        let findings = graph
            .outgoing(&file.path)
            .filter_map(|edge| {
                let target = graph.file(edge.target.as_deref()?)?;
                (target.role == FileRole::Repository).then(|| {
                    ctx.finding(
                        edge.line,
                        1,
                        format!(
                            "Controller imports repository '{}' directly",
                            target.path
                        ),
                    )
                    .with_suggestion("Route data access through a service")
                })
            })
            .collect();
        Ok(findings)
    })
    .description("Controllers importing repositories without a service layer")
    .category("architecture")
    .scope(RuleScope::Graph)
}
