//! Compiler from criteria strings to clause lists.

use std::collections::HashSet;

use serde::Serialize;

use super::ast::{Clause, FieldKey, Test};
use super::date;
use super::error::{Diagnostic, FilterError, FilterResult};
use super::lexer::{Lexer, PositionedSegment};
use super::value::parse_number;

/// A compiled criteria string.
///
/// Holds one [`Clause`] per well-formed segment, in input order, and the
/// diagnostics produced while compiling.
///
/// # Grammar
///
/// ```text
/// expr      ::= segment (";" segment)*
/// segment   ::= fieldkey ":" value
/// fieldkey  ::= name ("," name)*
/// value     ::= "!" value | range | "@" date | "~" pattern | "?" pattern | literal
/// range     ::= bound ".." bound
/// bound     ::= "@" date | number
/// ```
///
/// # Example
///
/// ```
/// use sift_expr_rs::CompiledExpression;
/// use std::collections::HashMap;
///
/// let expr = CompiledExpression::parse("name:~jdo;age:18..65");
/// assert_eq!(expr.len(), 2);
///
/// let record: HashMap<&str, &str> = [("name", "John Doe"), ("age", "42")].into();
/// assert!(expr.matches(&record));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledExpression {
    source: String,
    clauses: Vec<Clause>,
    diagnostics: Vec<Diagnostic>,
}

impl CompiledExpression {
    /// Compiles a criteria string.
    ///
    /// Never fails: malformed segments are dropped, unparseable bounds make
    /// their test fail closed, and both are recorded as diagnostics.
    pub fn parse(input: &str) -> Self {
        let scan = Lexer::new(input).tokenize_with_errors();
        let mut diagnostics = Vec::new();

        for error in scan.errors {
            tracing::warn!(
                segment = %error.segment,
                position = error.position,
                "dropping malformed criteria segment"
            );
            diagnostics.push(Diagnostic::MalformedSegment {
                segment: error.segment,
                position: error.position,
            });
        }

        let clauses: Vec<Clause> = scan
            .segments
            .iter()
            .map(|segment| compile_segment(segment, &mut diagnostics))
            .collect();

        for key in duplicate_keys(&clauses) {
            if cfg!(debug_assertions) {
                tracing::warn!(key = %key, "criteria string has duplicate key");
            }
            diagnostics.push(Diagnostic::DuplicateKey { key });
        }

        Self {
            source: input.to_string(),
            clauses,
            diagnostics,
        }
    }

    /// Compiles a criteria string, failing on the first dropped segment or
    /// unparseable operand.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::MalformedSegment`, `FilterError::InvalidRangeBound`
    /// or `FilterError::InvalidDate`. Duplicate keys are not errors.
    pub fn parse_strict(input: &str) -> FilterResult<Self> {
        let compiled = Self::parse(input);
        compiled.check()?;
        Ok(compiled)
    }

    /// Returns the first diagnostic that strict compilation rejects.
    ///
    /// # Errors
    ///
    /// See [`CompiledExpression::parse_strict`].
    pub fn check(&self) -> FilterResult<()> {
        match self.diagnostics.iter().find_map(Diagnostic::to_error) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Returns the input this expression was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the compiled clauses in input order.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Returns the diagnostics produced during compilation.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Returns the number of clauses.
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Returns true if there are no clauses. An empty expression matches everything.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Returns true if any diagnostic has error severity.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Compiles one segment, recording operand diagnostics.
fn compile_segment(segment: &PositionedSegment<'_>, diagnostics: &mut Vec<Diagnostic>) -> Clause {
    let test = parse_value(segment.key, segment.value, diagnostics);
    tracing::trace!(
        key = segment.key,
        op = test.operator(),
        position = segment.position,
        "compiled segment"
    );
    Clause::new(FieldKey::new(segment.key), test)
}

/// Parses an encoded value into a test.
fn parse_value(key: &str, value: &str, diagnostics: &mut Vec<Diagnostic>) -> Test {
    if let Some(rest) = value.strip_prefix('!') {
        return Test::negate(parse_value(key, rest, diagnostics));
    }

    // Only the first two `..`-separated pieces count: `1..2..3` is `1..2`.
    let mut bounds = value.split("..");
    if let (Some(low), Some(high)) = (bounds.next(), bounds.next()) {
        return parse_range(key, low, high, diagnostics);
    }

    if let Some(rest) = value.strip_prefix('@') {
        return Test::DateEquals {
            date: parse_date_operand(key, rest, diagnostics),
        };
    }

    if let Some(rest) = value.strip_prefix('~') {
        return Test::fuzzy(rest);
    }

    if let Some(rest) = value.strip_prefix('?') {
        return Test::search(rest);
    }

    Test::exact(value)
}

/// Parses `low..high`: a date range when both bounds start with `@`,
/// otherwise a numeric range.
fn parse_range(key: &str, low: &str, high: &str, diagnostics: &mut Vec<Diagnostic>) -> Test {
    match (low.strip_prefix('@'), high.strip_prefix('@')) {
        (Some(low), Some(high)) => Test::DateRange {
            low: parse_date_operand(key, low, diagnostics),
            high: parse_date_operand(key, high, diagnostics),
        },
        _ => Test::NumberRange {
            low: parse_bound(key, low, diagnostics),
            high: parse_bound(key, high, diagnostics),
        },
    }
}

fn parse_bound(key: &str, bound: &str, diagnostics: &mut Vec<Diagnostic>) -> Option<f64> {
    let parsed = parse_number(bound);
    if parsed.is_none() {
        tracing::warn!(key, bound, "range bound is not a number; range will never match");
        diagnostics.push(Diagnostic::InvalidRangeBound {
            key: key.to_string(),
            bound: bound.to_string(),
        });
    }
    parsed
}

fn parse_date_operand(
    key: &str,
    value: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<chrono::NaiveDateTime> {
    let parsed = date::parse(value);
    if parsed.is_none() {
        tracing::warn!(key, value, "operand is not a date; test will never match");
        diagnostics.push(Diagnostic::InvalidDate {
            key: key.to_string(),
            value: value.to_string(),
        });
    }
    parsed
}

/// Returns each key that appears more than once, in order of first repetition.
fn duplicate_keys(clauses: &[Clause]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut duplicates = Vec::new();

    for clause in clauses {
        let key = clause.key.as_str();
        if !seen.insert(key) && reported.insert(key) {
            duplicates.push(key.to_string());
        }
    }

    duplicates
}

impl std::str::FromStr for CompiledExpression {
    type Err = FilterError;

    fn from_str(s: &str) -> FilterResult<Self> {
        Self::parse_strict(s)
    }
}
