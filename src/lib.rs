//! graphgate - knowledge-graph powered change gate
//!
//! The library builds a [`graph::KnowledgeGraph`] from source files, runs
//! a registry of [`rules`] over it, filters findings through inline
//! [`suppression`] directives and aggregates them into a
//! [`aggregate::RunResult`] with a blocking decision.
//!
//! ```no_run
//! use graphgate::config::GateConfig;
//! use graphgate::pipeline::{AnalyzerBuilder, CancellationToken, SourceInput};
//!
//! let analyzer = AnalyzerBuilder::new(GateConfig::default()).build()?;
//! let analysis = analyzer.analyze(
//!     vec![
//!         SourceInput::new("a.ts", "import './b';"),
//!         SourceInput::new("b.ts", "import './a';"),
//!     ],
//!     &CancellationToken::new(),
//! )?;
//! assert!(analysis.result.blocked);
//! # Ok::<(), graphgate::error::GateError>(())
//! ```

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod graph;
pub mod models;
pub mod parsers;
pub mod pipeline;
pub mod reporters;
pub mod rules;
pub mod suppression;

pub use aggregate::{BlockingPolicy, RunResult};
pub use error::{Diagnostic, GateError};
pub use models::{Finding, Severity};
pub use pipeline::{Analysis, Analyzer, AnalyzerBuilder, CancellationToken, SourceInput};
pub use rules::{RuleContext, RuleDefinition, RuleRegistry};
