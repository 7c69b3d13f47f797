//! Large file rule

use crate::models::Severity;
use crate::rules::RuleDefinition;

pub const NAME: &str = "large-file";

const DEFAULT_MAX_LOC: i64 = 500;

pub fn large_file() -> RuleDefinition {
    RuleDefinition::new(NAME, Severity::Info, |ctx| {
        let max = ctx.threshold_or("max_loc", DEFAULT_MAX_LOC);
        let file = ctx.file();
        if i64::from(file.lines_of_code) <= max {
            return Ok(Vec::new());
        }

        Ok(vec![ctx
            .finding(
                1,
                1,
                format!(
                    "File has {} lines of code (max {}) and {} functions",
                    file.lines_of_code,
                    max,
                    file.functions.len()
                ),
            )
            .with_suggestion("Split the file along its functional groupings")])
    })
    .description("Files whose non-blank, non-comment line count exceeds a threshold")
    .category("size")
}
