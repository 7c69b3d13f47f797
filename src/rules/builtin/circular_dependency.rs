//! Circular dependency rule
//!
//! Reports each import cycle once, on the cycle's smallest file, at the
//! import that starts the cycle.

use crate::models::Severity;
use crate::rules::{RuleDefinition, RuleScope};

pub const NAME: &str = "circular-dependency";

pub fn circular_dependency() -> RuleDefinition {
    RuleDefinition::new(NAME, Severity::Error, |ctx| {
        let Some(query) = ctx.query() else {
            return Ok(Vec::new());
        };
        let path = ctx.file().path.as_str();

        let findings = query
            .cycles_through(path)
            .into_iter()
            .filter(|cycle| cycle.first().map(String::as_str) == Some(path))
            .map(|cycle| {
                let next = cycle.get(1).unwrap_or(&cycle[0]);
                let line = query
                    .graph()
                    .outgoing(path)
                    .find(|e| e.target.as_deref() == Some(next.as_str()))
                    .map(|e| e.line)
                    .unwrap_or(1);

                let mut chain: Vec<&str> = cycle.iter().map(String::as_str).collect();
                chain.push(path);
                ctx.finding(
                    line,
                    1,
                    format!(
                        "Circular dependency between {} files: {}",
                        cycle.len(),
                        chain.join(" -> ")
                    ),
                )
                .with_suggestion(
                    "Break the cycle by extracting shared code into a separate module \
                     or inverting one of the dependencies",
                )
            })
            .collect();
        Ok(findings)
    })
    .description("Detects import cycles between project files")
    .category("architecture")
    .scope(RuleScope::Graph)
}
