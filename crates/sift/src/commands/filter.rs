//! Filter command implementation.
//!
//! Reads JSON records, turns every criterion given on the command line into a
//! producer on one coordinator, and prints the records that pass them all.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value as Json;
use sift_compose_rs::control::{ExpressionControl, RangeControl, TextControl};
use sift_compose_rs::view::FilteredView;
use sift_compose_rs::Coordinator;
use sift_expr_rs::ExpressionCompiler;

use super::{CommandContext, CommandError, Result};
use crate::cli::{FieldValue, RangeBounds};

/// Options for the filter command.
#[derive(Debug, Default)]
pub struct FilterOptions {
    /// Criteria string.
    pub expression: Option<String>,
    /// Input file; stdin when absent.
    pub input: Option<PathBuf>,
    /// Exact matches.
    pub exact: Vec<FieldValue>,
    /// Fuzzy matches.
    pub fuzzy: Vec<FieldValue>,
    /// Multi-field substring searches.
    pub search: Vec<FieldValue>,
    /// Numeric ranges.
    pub range: Vec<RangeBounds>,
    /// Reject criteria with diagnostics instead of warning.
    pub strict: bool,
    /// Print only the count.
    pub count: bool,
    /// Maximum number of matches to print.
    pub limit: Option<usize>,
}

/// Result of filtering a set of records.
#[derive(Debug)]
pub struct FilterOutcome {
    /// Number of records read.
    pub total: usize,
    /// Records that passed every criterion, up to the limit.
    pub matches: Vec<Json>,
    /// Number of records that passed, ignoring the limit.
    pub matched: usize,
}

/// Executes the filter command.
///
/// # Errors
///
/// Returns an error if the input cannot be read or parsed, or if `--strict`
/// is set and a criterion is invalid.
pub fn execute(
    ctx: &CommandContext,
    opts: &FilterOptions,
    compiler: &Arc<ExpressionCompiler>,
) -> Result<()> {
    let text = read_input(opts.input.as_ref())?;
    let records = parse_records(&text)?;
    let outcome = filter_records(records, opts, compiler)?;

    tracing::debug!(
        total = outcome.total,
        matched = outcome.matched,
        cached = compiler.len(),
        "filter finished"
    );

    if opts.count {
        if ctx.json_output {
            let output = serde_json::json!({
                "total": outcome.total,
                "matched": outcome.matched,
            });
            println!("{}", ctx.to_json(&output)?);
        } else {
            println!("{}", outcome.matched);
        }
    } else if ctx.json_output {
        let output = serde_json::json!({
            "total": outcome.total,
            "matched": outcome.matched,
            "records": outcome.matches,
        });
        println!("{}", ctx.to_json(&output)?);
    } else {
        for record in &outcome.matches {
            println!("{}", serde_json::to_string(record)?);
        }
    }

    Ok(())
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path).map_err(|e| {
            CommandError::Input(format!("Failed to read {}: {}", path.display(), e))
        }),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

/// Parses a JSON array of objects, or one object per line.
pub fn parse_records(text: &str) -> Result<Vec<Json>> {
    let trimmed = text.trim_start();
    let records: Vec<Json> = if trimmed.is_empty() {
        Vec::new()
    } else if trimmed.starts_with('[') {
        serde_json::from_str(trimmed)?
    } else {
        text.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str(line)
                    .map_err(|e| CommandError::Input(format!("line {}: {}", n + 1, e)))
            })
            .collect::<Result<_>>()?
    };

    if let Some(position) = records.iter().position(|r| !r.is_object()) {
        return Err(CommandError::Input(format!(
            "record {} is not a JSON object",
            position + 1
        )));
    }

    tracing::debug!(count = records.len(), "read records");
    Ok(records)
}

/// Every producer built from the command line, kept alive while the view is read.
struct Controls {
    expression: Option<ExpressionControl<Json>>,
    text: Vec<TextControl<Json>>,
    ranges: Vec<RangeControl<Json>>,
}

impl Controls {
    fn build(opts: &FilterOptions, compiler: &Arc<ExpressionCompiler>) -> Result<Self> {
        let expression = match opts.expression.as_deref() {
            Some(input) if !input.is_empty() => {
                check_expression(input, opts.strict, compiler)?;
                Some(ExpressionControl::new(Arc::clone(compiler)).with_expression(input))
            }
            _ => None,
        };

        let mut text = Vec::new();
        for arg in &opts.exact {
            text.push(TextControl::exact(arg.field.as_str()).with_value(arg.value.as_str()));
        }
        for arg in &opts.fuzzy {
            text.push(TextControl::fuzzy(arg.field.as_str()).with_value(arg.value.as_str()));
        }
        for arg in &opts.search {
            text.push(TextControl::search(arg.fields()).with_value(arg.value.as_str()));
        }

        let mut ranges = Vec::new();
        for arg in &opts.range {
            let control = RangeControl::new(arg.field.as_str());
            control.set_range(arg.low.as_str(), arg.high.as_str());
            if !control.is_active() {
                let message = format!(
                    "range '{}..{}' on '{}' needs two numbers with low < high",
                    arg.low, arg.high, arg.field
                );
                if opts.strict {
                    return Err(CommandError::Usage(message));
                }
                tracing::warn!("{message}; ignoring it");
            }
            ranges.push(control);
        }

        Ok(Self {
            expression,
            text,
            ranges,
        })
    }

    fn attach(&self, coordinator: &Coordinator<Json>) {
        if let Some(expression) = &self.expression {
            expression.attach(coordinator);
        }
        for control in &self.text {
            control.attach(coordinator);
        }
        for control in &self.ranges {
            control.attach(coordinator);
        }
    }
}

/// Compiles `input` once up front so problems surface before filtering.
fn check_expression(input: &str, strict: bool, compiler: &ExpressionCompiler) -> Result<()> {
    if strict {
        compiler.compile_strict(input)?;
        return Ok(());
    }

    let compiled = compiler.compile(input);
    for diagnostic in compiled.diagnostics().iter().filter(|d| d.is_error()) {
        tracing::warn!(%diagnostic, "clause will never match");
    }
    Ok(())
}

/// Filters records through a coordinator built from the options.
pub fn filter_records(
    records: Vec<Json>,
    opts: &FilterOptions,
    compiler: &Arc<ExpressionCompiler>,
) -> Result<FilterOutcome> {
    let total = records.len();
    let controls = Controls::build(opts, compiler)?;

    let coordinator = Coordinator::new();
    let view = FilteredView::attach(&coordinator, records);
    controls.attach(&coordinator);

    let predicate = view.predicate();
    tracing::debug!(
        controls = coordinator.control_count(),
        active = predicate.active_criteria(),
        notifications = view.notifications(),
        "criteria composed"
    );
    for label in predicate.labels() {
        tracing::trace!(criterion = label, "active criterion");
    }

    let filtered = view.filtered();
    let matched = filtered.len();
    let limit = opts.limit.unwrap_or(usize::MAX);
    let matches = filtered.into_iter().take(limit).cloned().collect();

    Ok(FilterOutcome {
        total,
        matches,
        matched,
    })
}
