//! Error and diagnostic types
//!
//! Only `GateError` aborts a run. Everything else degrades to a
//! `Diagnostic` carried alongside the result.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal errors: broken setup or an explicit cancellation
#[derive(Error, Debug)]
pub enum GateError {
    #[error("Duplicate rule name: '{0}' is already registered")]
    DuplicateRuleName(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Analysis cancelled")]
    Cancelled,

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type GateResult<T> = Result<T, GateError>;

/// A parser adapter could not produce a usable tree
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{line}:{column}: {message}")]
pub struct ParseError {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl ParseError {
    pub fn new(line: u32, column: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileErrorKind {
    Parse(ParseError),
    Read(String),
    /// Input path climbs above the project root
    InvalidPath,
}

/// A single file dropped from the graph
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{path}: {}", describe(.kind))]
pub struct FileError {
    pub path: String,
    pub kind: FileErrorKind,
}

fn describe(kind: &FileErrorKind) -> String {
    match kind {
        FileErrorKind::Parse(e) => format!("parse error at {}", e),
        FileErrorKind::Read(e) => format!("read error: {}", e),
        FileErrorKind::InvalidPath => "path escapes the project root".to_string(),
    }
}

impl FileError {
    pub fn parse(path: impl Into<String>, error: ParseError) -> Self {
        Self {
            path: path.into(),
            kind: FileErrorKind::Parse(error),
        }
    }

    pub fn read(path: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: FileErrorKind::Read(error.into()),
        }
    }

    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: FileErrorKind::InvalidPath,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    ParseError,
    ReadError,
    InvalidPath,
    UnresolvedImport,
    DeadSuppression,
    UnknownRuleConfig,
}

/// A non-fatal problem recorded during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            file: None,
            line: None,
            message: message.into(),
        }
    }

    pub fn at(mut self, file: impl Into<String>, line: Option<u32>) -> Self {
        self.file = Some(file.into());
        self.line = line;
        self
    }
}

impl From<&FileError> for Diagnostic {
    fn from(err: &FileError) -> Self {
        match &err.kind {
            FileErrorKind::Parse(p) => {
                Diagnostic::new(DiagnosticKind::ParseError, p.message.clone())
                    .at(err.path.clone(), Some(p.line))
            }
            FileErrorKind::Read(msg) => {
                Diagnostic::new(DiagnosticKind::ReadError, msg.clone()).at(err.path.clone(), None)
            }
            FileErrorKind::InvalidPath => {
                Diagnostic::new(DiagnosticKind::InvalidPath, describe(&err.kind))
                    .at(err.path.clone(), None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_error_display() {
        let err = FileError::parse("src/a.ts", ParseError::new(3, 7, "unexpected token"));
        assert_eq!(err.to_string(), "src/a.ts: parse error at 3:7: unexpected token");
    }

    #[test]
    fn test_diagnostic_from_file_error() {
        let err = FileError::read("b.ts", "permission denied");
        let diag = Diagnostic::from(&err);
        assert_eq!(diag.kind, DiagnosticKind::ReadError);
        assert_eq!(diag.file.as_deref(), Some("b.ts"));
        assert_eq!(diag.line, None);
    }

    #[test]
    fn test_invalid_path_diagnostic() {
        let err = FileError::invalid_path("../outside.ts");
        assert_eq!(err.to_string(), "../outside.ts: path escapes the project root");
        let diag = Diagnostic::from(&err);
        assert_eq!(diag.kind, DiagnosticKind::InvalidPath);
        assert_eq!(diag.file.as_deref(), Some("../outside.ts"));
    }
}
