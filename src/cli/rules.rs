//! `graphgate rules`

use crate::rules::{RuleRegistry, RuleScope};
use anyhow::Result;
use console::style;

pub(super) fn run() -> Result<()> {
    let registry = RuleRegistry::with_builtin()?;
    println!("{}", style(format!("{} rules", registry.len())).bold());
    for rule in registry.iter() {
        let scope = match rule.scope {
            RuleScope::File => "file",
            RuleScope::Graph => "graph",
        };
        println!(
            "  {:<22} {:<8} {:<15} {:<5} {}",
            style(&rule.name).cyan(),
            rule.severity.as_str(),
            rule.category,
            scope,
            style(&rule.description).dim()
        );
    }
    Ok(())
}
