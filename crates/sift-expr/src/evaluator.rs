//! Evaluation of compiled expressions against records.
//!
//! Every test fails closed: an absent field, a value that is not a number or
//! a date, or an operand that did not parse makes the test false rather than
//! raising.
//!
//! # Example
//!
//! ```
//! use sift_expr_rs::{build_predicate, CompiledExpression};
//! use serde_json::json;
//!
//! let records = vec![
//!     json!({"name": "ada", "born": "1815-12-10"}),
//!     json!({"name": "grace", "born": "1906-12-09"}),
//! ];
//!
//! let expr = CompiledExpression::parse("born:@1900-01-01..@1999-12-31");
//! let matching = expr.filter(&records);
//! assert_eq!(matching.len(), 1);
//!
//! let predicate = build_predicate("name:ADA");
//! assert_eq!(records.iter().filter(|r| predicate.matches(*r)).count(), 1);
//! ```

use std::sync::Arc;

use super::ast::{Clause, FieldKey, Test};
use super::parser::CompiledExpression;
use super::value::Record;

impl Test {
    /// Evaluates the test against the field(s) named by `key`.
    pub fn evaluate<R: Record + ?Sized>(&self, record: &R, key: &FieldKey) -> bool {
        match self {
            Test::Not { inner } => !inner.evaluate(record, key),

            Test::Search { pattern } => key
                .names()
                .iter()
                .filter_map(|name| record.field(name))
                .any(|value| pattern.is_match(&value.to_text())),

            Test::Exact { expected } => record
                .field(key.as_str())
                .is_some_and(|value| value.to_text().to_lowercase() == *expected),

            Test::Fuzzy { pattern } => record
                .field(key.as_str())
                .is_some_and(|value| pattern.is_match(&value.to_text())),

            Test::DateEquals { date } => {
                let Some(date) = date else {
                    return false;
                };
                record
                    .field(key.as_str())
                    .and_then(|value| value.as_date())
                    .is_some_and(|value| value == *date)
            }

            Test::DateRange { low, high } => {
                let (Some(low), Some(high)) = (low, high) else {
                    return false;
                };
                record
                    .field(key.as_str())
                    .and_then(|value| value.as_date())
                    .is_some_and(|value| *low <= value && value <= *high)
            }

            Test::NumberRange { low, high } => {
                let (Some(low), Some(high)) = (low, high) else {
                    return false;
                };
                record
                    .field(key.as_str())
                    .and_then(|value| value.as_number())
                    .is_some_and(|value| *low <= value && value <= *high)
            }
        }
    }
}

impl Clause {
    /// Returns true if the record passes this clause.
    pub fn matches<R: Record + ?Sized>(&self, record: &R) -> bool {
        self.test.evaluate(record, &self.key)
    }
}

impl CompiledExpression {
    /// Returns true if the record passes every clause.
    ///
    /// An expression with no clauses matches every record.
    pub fn matches<R: Record + ?Sized>(&self, record: &R) -> bool {
        self.clauses().iter().all(|clause| clause.matches(record))
    }

    /// Filters a slice of records, returning only those that match.
    pub fn filter<'b, R: Record>(&self, records: &'b [R]) -> Vec<&'b R> {
        records.iter().filter(|record| self.matches(*record)).collect()
    }
}

/// A shareable predicate over records, backed by a compiled expression.
#[derive(Debug, Clone)]
pub struct Predicate {
    expression: Arc<CompiledExpression>,
}

impl Predicate {
    /// Wraps a compiled expression.
    pub fn new(expression: Arc<CompiledExpression>) -> Self {
        Self { expression }
    }

    /// Returns true if the record passes every clause.
    pub fn matches<R: Record + ?Sized>(&self, record: &R) -> bool {
        self.expression.matches(record)
    }

    /// Returns the underlying expression.
    pub fn expression(&self) -> &Arc<CompiledExpression> {
        &self.expression
    }
}

/// Compiles `input` and returns a predicate over records.
///
/// Uses no cache; see [`ExpressionCompiler`](crate::ExpressionCompiler) for a
/// memoizing compiler.
pub fn build_predicate(input: &str) -> Predicate {
    Predicate::new(Arc::new(CompiledExpression::parse(input)))
}
