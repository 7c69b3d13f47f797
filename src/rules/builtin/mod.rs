//! Built-in rules
//!
//! A small default set covering both scopes. Thresholds are read from
//! `[rules.<name>] thresholds` in the project configuration.

mod circular_dependency;
mod complex_function;
mod empty_catch;
mod large_file;
mod layer_violation;

pub use circular_dependency::circular_dependency;
pub use complex_function::complex_function;
pub use empty_catch::empty_catch;
pub use large_file::large_file;
pub use layer_violation::layer_violation;

use super::RuleDefinition;

/// Every built-in rule, each with a distinct name
pub fn all() -> Vec<RuleDefinition> {
    vec![
        circular_dependency(),
        complex_function(),
        empty_catch(),
        large_file(),
        layer_violation(),
    ]
}
