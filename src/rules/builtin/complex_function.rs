//! Complex function rule

use crate::models::Severity;
use crate::rules::RuleDefinition;

pub const NAME: &str = "complex-function";

/// Default cyclomatic complexity limit (`max_complexity` threshold)
const DEFAULT_MAX_COMPLEXITY: i64 = 10;

pub fn complex_function() -> RuleDefinition {
    RuleDefinition::new(NAME, Severity::Warning, |ctx| {
        let max = ctx.threshold_or("max_complexity", DEFAULT_MAX_COMPLEXITY);

        let findings = ctx
            .file()
            .functions
            .iter()
            .filter(|f| i64::from(f.complexity) > max)
            .map(|f| {
                ctx.finding(
                    f.line,
                    1,
                    format!(
                        "Function '{}' has cyclomatic complexity {} (max {})",
                        f.name, f.complexity, max
                    ),
                )
                .with_suggestion("Extract branches into smaller functions")
            })
            .collect();
        Ok(findings)
    })
    .description("Functions whose cyclomatic complexity exceeds a threshold")
    .category("complexity")
}
