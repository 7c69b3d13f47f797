//! JSON reporter
//!
//! Outputs the full RunResult as pretty-printed JSON with camelCase keys.

use crate::aggregate::RunResult;
use anyhow::Result;

pub fn render(result: &RunResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}
