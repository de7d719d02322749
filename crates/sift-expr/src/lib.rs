//! Compiler for key:value filter criteria strings.
//!
//! A criteria string is a `;`-separated list of `key:value` segments. Each
//! segment compiles to one test against a record field, and a record passes
//! when it passes every test.
//!
//! # Operators
//!
//! | value | meaning |
//! |-------|---------|
//! | `asdf` | case-insensitive equality |
//! | `!v` | negation of whatever `v` means |
//! | `1..10` | inclusive numeric range |
//! | `@2017-01-01` | same date |
//! | `@2017-01-01..@2017-12-31` | inclusive date range |
//! | `~asdf` | case-insensitive subsequence match |
//! | `?adf` with key `a,g` | subsequence match on any of the fields |
//!
//! # Example
//!
//! ```
//! use sift_expr_rs::{ExpressionCompiler, Record};
//! use std::collections::HashMap;
//!
//! let compiler = ExpressionCompiler::new();
//! let expr = compiler.compile("a:asdf;b:!1;d:1..10");
//!
//! let record: HashMap<&str, &str> = [("a", "ASDF"), ("b", "2"), ("d", "10")].into();
//! assert!(expr.matches(&record));
//! ```

mod ast;
mod cache;
mod date;
mod error;
mod evaluator;
mod lexer;
mod parser;
mod value;

pub use ast::{Clause, FieldKey, FuzzyPattern, Test};
pub use cache::ExpressionCompiler;
pub use date::parse as parse_date;
pub use error::{Diagnostic, FilterError, FilterResult, Severity};
pub use evaluator::{build_predicate, Predicate};
pub use lexer::{encode_segments, Lexer, PositionedSegment, ScanError, ScanResult, Segment};
pub use parser::CompiledExpression;
pub use value::{Record, Value};
