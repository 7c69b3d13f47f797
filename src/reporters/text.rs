//! Text (terminal) reporter

use crate::aggregate::RunResult;
use crate::models::{Finding, Severity};
use anyhow::Result;
use console::{style, StyledObject};
use std::fmt::Write;

fn severity_label(severity: Severity) -> StyledObject<&'static str> {
    let label = match severity {
        Severity::Critical => "CRIT",
        Severity::Error => "ERR ",
        Severity::Warning => "WARN",
        Severity::Info => "INFO",
    };
    match severity {
        Severity::Critical => style(label).red().bold(),
        Severity::Error => style(label).red(),
        Severity::Warning => style(label).yellow(),
        Severity::Info => style(label).dim(),
    }
}

fn write_finding(out: &mut String, finding: &Finding) -> std::fmt::Result {
    writeln!(
        out,
        "  {} {}:{}:{}  {}  {}",
        severity_label(finding.severity),
        finding.file,
        finding.line,
        finding.column,
        finding.message,
        style(&finding.rule).dim()
    )?;
    if let Some(suggestion) = &finding.suggestion {
        writeln!(out, "       {}", style(suggestion).cyan())?;
    }
    Ok(())
}

/// Render a run result as terminal output
pub fn render(result: &RunResult) -> Result<String> {
    let mut out = String::new();

    writeln!(out, "\n{}", style("graphgate check").bold())?;
    writeln!(out, "{}", style("──────────────────────────────────────").dim())?;
    writeln!(
        out,
        "Files: {}  Findings: {}  Suppressed: {}\n",
        result.files_analyzed,
        result.total(),
        result.suppressed
    )?;

    for severity in Severity::ALL {
        let findings = result.by_severity.get(severity);
        if findings.is_empty() {
            continue;
        }
        writeln!(
            out,
            "{} ({})",
            style(severity.as_str().to_uppercase()).bold(),
            findings.len()
        )?;
        for finding in findings {
            write_finding(&mut out, finding)?;
        }
        writeln!(out)?;
    }

    if !result.diagnostics.is_empty() {
        writeln!(out, "{} ({})", style("DIAGNOSTICS").bold(), result.diagnostics.len())?;
        for d in &result.diagnostics {
            let location = match (&d.file, d.line) {
                (Some(file), Some(line)) => format!("{}:{}", file, line),
                (Some(file), None) => file.clone(),
                _ => "-".to_string(),
            };
            writeln!(out, "  {}  {}", style(location).dim(), d.message)?;
        }
        writeln!(out)?;
    }

    if result.blocked {
        writeln!(out, "{}", style("✗ Blocked").red().bold())?;
    } else if result.warned {
        writeln!(out, "{}", style("! Passed with warnings").yellow().bold())?;
    } else {
        writeln!(out, "{}", style("✓ Passed").green().bold())?;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::BlockingPolicy;
    use crate::reporters::tests::test_result;

    #[test]
    fn test_text_lists_findings_and_verdict() {
        let text = render(&test_result()).expect("render text");
        assert!(text.contains("src/a.ts:1:1"));
        assert!(text.contains("Circular dependency between 2 files"));
        assert!(text.contains("Split the file"));
        assert!(text.contains("src/broken.ts:4"));
        assert!(text.contains("Blocked"));
    }

    #[test]
    fn test_text_empty_result_passes() {
        let result = BlockingPolicy::default().aggregate(Vec::new());
        let text = render(&result).expect("render text");
        assert!(text.contains("Passed"));
        assert!(!text.contains("DIAGNOSTICS"));
    }
}
